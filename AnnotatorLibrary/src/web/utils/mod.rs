pub mod multipart;
pub mod response;
