pub mod complaint;
pub mod home;
pub mod submitted;

pub use complaint::complaint_page;
pub use home::home_page;
pub use submitted::submitted_page;
