/// Router Module Index
///
/// Splits the routing table by access level so that protection is applied once per
/// router (as a layer) instead of being remembered per endpoint.

/// Routes open to anonymous visitors: health, login/logout, contact form, the
/// public navigation tree and the SEO artifacts.
pub mod public;

/// REST endpoints of the admin panel. Every route requires a valid session.
pub mod authenticated;

/// REST endpoints restricted to the `admin` role (user management).
pub mod admin;

/// Server-rendered HTML: the public website and the `/admin` shell.
pub mod site;
