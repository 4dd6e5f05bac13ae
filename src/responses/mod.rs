pub mod errors;
pub mod html;

pub use errors::{error_response, ResultResp};
pub use html::{html_response, html_response_with_status, redirect_see_other, text_response};
