// Google Drive collaborators: service-account authorization and the Drive v3 client.

pub mod credentials;
pub mod drive;
