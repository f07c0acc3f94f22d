pub mod category;
pub mod comment;
pub mod playlist;
pub mod reaction;
pub mod subscription;
pub mod user;
pub mod video;
