//! Posting captured images to a social-media account.
//!
//! [`Publisher`] is what the motion loop talks to. [`MediaPublisher`] builds
//! the caption and drives a [`SocialApi`] (normally [`TwitterClient`]);
//! [`DryRunPublisher`] only logs.

mod caption;
mod client;
mod credentials;
mod oauth;
mod publisher;

pub use caption::{caption_for, format_caption, format_offset_hours, MAX_POST_CHARS};
pub use client::{
    parse_retry_after, MediaId, PostRecord, SocialApi, SocialError, TwitterClient, API_BASE_URL,
    UPLOAD_BASE_URL,
};
pub use credentials::{
    CredentialError, Credentials, ACCESS_TOKEN_ENV, ACCESS_TOKEN_SECRET_ENV, API_KEY_ENV,
    API_SECRET_ENV,
};
pub use oauth::{
    authorization_header, percent_encode, sign, signature_base_string, Nonce, SigningError,
};
pub use publisher::{DryRunPublisher, MediaPublisher, PublishError, Publisher};
