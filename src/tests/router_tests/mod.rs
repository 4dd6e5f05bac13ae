mod admin_tests;
mod intake_tests;
mod media_tests;
mod status_page_tests;
