// Request bodies for the backend's JSON endpoints

use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RenameRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct StreamRequest<'a> {
    pub message: &'a str,
    /// Always present; `null` asks the backend to create a thread
    pub thread_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EditRequest<'a> {
    pub message_id: &'a str,
    pub new_content: &'a str,
}
