#[cfg(test)]
pub mod fixtures;

#[cfg(test)]
mod caption_ws_tests;
#[cfg(test)]
mod session_api_tests;
