//! Portal endpoint paths and login form fields.

/// Login page; also the target of the credential POST.
pub(crate) const LOGIN: &str = "login";

/// Redirect target that signals an authenticated session.
pub(crate) const SUCCESS: &str = "success.jsp";

/// Challenge image endpoint.
pub(crate) const CHALLENGE_IMAGE: &str = "validatecode.jsp?type=login";

/// Value of the `model` field expected by the login handler.
pub(crate) const LOGIN_MODEL: &str = "uplogin.jsp";

/// Form fields of the credential POST.
pub(crate) mod field {
    pub(crate) const MODEL: &str = "model";
    pub(crate) const LOGIN_TOKEN: &str = "CAS_LT";
    pub(crate) const SERVICE: &str = "service";
    pub(crate) const WARN: &str = "warn";
    pub(crate) const SHOW_CODE: &str = "showCode";
    pub(crate) const USERNAME: &str = "username";
    pub(crate) const PASSWORD: &str = "password";
    pub(crate) const BUTTON: &str = "button";
    /// The challenge answer, submitted only when the form demands one.
    pub(crate) const CHALLENGE: &str = "LT";
}
