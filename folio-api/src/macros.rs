//! Macros shared across the API crate.

/// Implement `FromRef<AppState>` for a state field so handlers and
/// middleware can extract it directly.
///
/// ```rust,ignore
/// impl_from_ref!(Arc<AuthConfig>, auth_config);
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
