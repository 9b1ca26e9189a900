use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures::Future;
use futures::FutureExt;

use crate::error::{panic_payload, AppError};

fn app_error_from_panic(payload: Box<dyn Any + Send>) -> AppError {
    let error = AppError::new("RUNTIME/PANIC", panic_payload(payload.as_ref()));
    error.log_with_event("panic_caught");
    error
}

/// Run `f`, turning a panic into a `RUNTIME/PANIC` error.
pub fn dispatch_with_fence<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => Ok(result),
        Err(payload) => Err(app_error_from_panic(payload)),
    }
}

/// Async counterpart of [`dispatch_with_fence`]; covers both building the
/// future and polling it.
pub async fn dispatch_async_with_fence<F, Fut, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let fut = dispatch_with_fence(|| AssertUnwindSafe(f()).catch_unwind())?;
    match fut.await {
        Ok(value) => Ok(value),
        Err(payload) => Err(app_error_from_panic(payload)),
    }
}
