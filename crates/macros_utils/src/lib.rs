//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web;

/// Generates a `pub fn routes(cfg: &mut ServiceConfig)` for the current module.
///
/// `route name` registers a handler produced by the actix routing macros,
/// `mod name` delegates to that child module's own `routes` function.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     mod urls,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($($entries:tt)*) => {
        pub fn routes(cfg: &mut $crate::actix_web::web::ServiceConfig) {
            $crate::__register_routes!(cfg; $($entries)*);
        }
    };
}

#[cfg(feature = "actix")]
#[doc(hidden)]
#[macro_export]
macro_rules! __register_routes {
    ($cfg:ident;) => {};
    ($cfg:ident; route $handler:ident $(, $($rest:tt)*)?) => {
        $cfg.service($handler);
        $crate::__register_routes!($cfg; $($($rest)*)?);
    };
    ($cfg:ident; mod $module:ident $(, $($rest:tt)*)?) => {
        $cfg.configure($module::routes);
        $crate::__register_routes!($cfg; $($($rest)*)?);
    };
}
