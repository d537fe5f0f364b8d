//! Identity and session handling for citizens (`user`) and staff (`handler`).
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/auth/register/{user,handler}` | Create an account, send confirmation mail |
//! | GET/POST | `/api/auth/{kind}/login` | Login form / log in (sets session cookie) |
//! | POST | `/api/auth/{kind}/logout` | Clear the session |
//! | GET | `/api/auth/{kind}/confirm/{token}` | Confirm the account |
//! | POST | `/api/auth/{kind}/password-reset-request` | Mail a reset link |
//! | POST | `/api/auth/{kind}/password-reset/{token}` | Set a new password |
//! | POST | `/api/auth/resend-confirmation` | New confirmation link |
//! | GET | `/api/auth/me` | Current principal |
//! | PUT | `/api/auth/password`, `/api/auth/email` | Credential changes |
//! | GET | `/api/auth/reauthenticate` | Drop a stale session |
//! | GET | `/api/auth/oauth2/{provider}/{authorize,callback}` | External login |

pub mod clients;
pub mod dtos;
pub mod guards;
pub mod handlers;
pub mod password;
pub mod principal;
pub mod redirect;
pub mod routes;
pub mod services;
pub mod session;
pub mod tokens;

pub use guards::{
    RequireAdmin, RequireAuthenticated, RequireHandler, RequireMember, RequireModerator,
    RequireUser,
};
pub use principal::{CurrentHandler, CurrentUser, Principal, PrincipalKind};
