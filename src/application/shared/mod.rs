pub mod api_key_helpers;
pub mod outbound_request;
