pub mod callback;
pub mod channel;
pub mod dispatcher;
pub mod render;
pub mod runner;
pub mod telegram;

pub use callback::CallbackHandler;
pub use channel::{Channel, DeliveryError};
pub use dispatcher::{CycleReport, Dispatcher};
pub use runner::{stop_on_signal, Notifier, StopHandle, TickReport};
pub use telegram::TelegramChannel;
