//! Response shaping shared by every route: framework rejections and panics
//! leave in the same `{status, message, data}` envelope as handler errors.

mod json_error;
mod panic;

pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
