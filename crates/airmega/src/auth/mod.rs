//! Authentication against the vendor identity provider.

mod authenticator;
mod cookies;
mod encoder;
mod login_page;

pub use authenticator::{Authenticator, extract_auth_code};
pub use cookies::SessionCookies;
pub use encoder::{CredentialEncoder, LegacyCipherEncoder, PlainPasswordEncoder, encoder_for};
pub use login_page::{HtmlFormParser, LoginPageParser, decode_entities, find_attribute};
