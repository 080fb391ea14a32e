//! The API endpoint URIs.

/// The service descriptor with link hints.
pub const ROOT: &str = "/";
/// The route for registering a new user.
pub const REGISTER: &str = "/auth/users/register";
/// The route for signing in.
pub const LOGIN: &str = "/auth/users/login";
/// The route for the currently authenticated user.
pub const ME: &str = "/auth/users/me";
/// The route for uploading an image.
pub const UPLOAD_IMAGE: &str = "/auth/images/upload";
/// The route for listing the caller's images.
pub const IMAGES: &str = "/auth/images";
/// The route for listing accounts.
pub const ACCOUNTS: &str = "/accounts";
/// The route for listing and creating transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route for the newest transactions.
pub const LATEST_TRANSACTIONS: &str = "/transactions/latest";
/// The route for a single transaction.
pub const TRANSACTION: &str = "/transactions/{slug}";
/// The route for listing users.
pub const USERS: &str = "/users";
/// The route for a single user.
pub const USER: &str = "/users/{slug}";
/// The route for listing categories.
pub const CATEGORIES: &str = "/categories";
/// The route for a single category.
pub const CATEGORY: &str = "/categories/{slug}";
/// The route for listing budgets.
pub const BUDGETS: &str = "/budgets";
/// The route for a single budget.
pub const BUDGET: &str = "/budgets/{slug}";
/// The route for listing payment methods.
pub const PAYMENT_METHODS: &str = "/payment_methods";
/// The route for a single payment method.
pub const PAYMENT_METHOD: &str = "/payment_methods/{slug}";
