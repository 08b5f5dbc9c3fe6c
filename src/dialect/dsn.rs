//! DSN parsing: driver detection, database-name splitting and pool URLs.
//!
//! MySQL accepts both the driver-style form `user:pass@tcp(host:port)/dbname?opts` and a
//! `mysql://` URL. Postgres DSNs are URLs. SQLite DSNs are file paths or `sqlite:` URLs.

use crate::dialect::Engine;
use crate::error::ConfigError;
use regex::Regex;
use std::sync::LazyLock;

static MYSQL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<user>[^:@]*)(?::(?P<pass>.*))?@)?(?P<net>[A-Za-z0-9]+)?(?:\((?P<addr>[^)]*)\))?$")
        .expect("valid mysql dsn regex")
});

const MYSQL_DEFAULT_ADDR: &str = "127.0.0.1:3306";

/// Engine implied by a DSN's scheme, when it has one.
pub fn driver_from_dsn(dsn: &str) -> Option<Engine> {
    let lower = dsn.trim().to_ascii_lowercase();
    if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
        Some(Engine::MySql)
    } else if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
        Some(Engine::Postgres)
    } else if lower.starts_with("sqlite:") {
        Some(Engine::Sqlite)
    } else {
        None
    }
}

/// Split a DSN into the database name and a DSN for the same server without one.
///
/// Returns `("", "")` for SQLite and for DSNs that name no database.
pub fn split_dsn(engine: Engine, dsn: &str) -> Result<(String, String), ConfigError> {
    match engine {
        Engine::Sqlite => Ok((String::new(), String::new())),
        Engine::MySql if dsn.contains("://") => split_url(engine, dsn),
        Engine::MySql => split_mysql_driver_style(dsn),
        Engine::Postgres => {
            if !dsn.contains("://") {
                return Err(invalid(engine, "expected a postgres:// url"));
            }
            split_url(engine, dsn)
        }
    }
}

fn split_mysql_driver_style(dsn: &str) -> Result<(String, String), ConfigError> {
    let Some(slash) = dsn.rfind('/') else {
        return Err(invalid(Engine::MySql, "missing '/' before the database name"));
    };
    let (prefix, rest) = (&dsn[..slash], &dsn[slash + 1..]);
    if !MYSQL_PREFIX.is_match(prefix) {
        return Err(invalid(Engine::MySql, "expected user:password@net(addr)/dbname"));
    }
    let (db_name, query) = match rest.split_once('?') {
        Some((db, q)) => (db, Some(q)),
        None => (rest, None),
    };
    if db_name.is_empty() {
        return Ok((String::new(), String::new()));
    }
    let mut server = format!("{}/", prefix);
    if let Some(q) = query {
        server.push('?');
        server.push_str(q);
    }
    Ok((db_name.to_string(), server))
}

/// `scheme://authority/db?query` -> (`db`, `scheme://authority/?query`).
fn split_url(engine: Engine, dsn: &str) -> Result<(String, String), ConfigError> {
    let Some(scheme_end) = dsn.find("://") else {
        return Err(invalid(engine, "missing scheme"));
    };
    let after_scheme = scheme_end + 3;
    let (without_query, query) = match dsn.split_once('?') {
        Some((base, q)) => (base, Some(q)),
        None => (dsn, None),
    };
    if without_query.len() < after_scheme {
        return Err(invalid(engine, "query before authority"));
    }
    let (base, path) = match without_query[after_scheme..].find('/') {
        Some(pos) => without_query.split_at(after_scheme + pos),
        None => (without_query, ""),
    };
    let db_name = path.trim_matches('/');
    if db_name.is_empty() {
        return Ok((String::new(), String::new()));
    }
    let mut server = format!("{}/", base);
    if let Some(q) = query {
        server.push('?');
        server.push_str(q);
    }
    Ok((db_name.to_string(), server))
}

/// URL the sqlx pool connects with.
pub fn connect_url(engine: Engine, dsn: &str) -> Result<String, ConfigError> {
    let dsn = dsn.trim();
    match engine {
        Engine::Sqlite => Ok(sqlite_url(dsn)),
        Engine::Postgres => {
            if dsn.contains("://") {
                Ok(dsn.to_string())
            } else {
                Err(invalid(engine, "expected a postgres:// url"))
            }
        }
        Engine::MySql if dsn.contains("://") => Ok(dsn.to_string()),
        Engine::MySql => mysql_url(dsn),
    }
}

/// Whether a SQLite DSN names an in-memory database.
pub fn is_memory(dsn: &str) -> bool {
    let dsn = dsn.trim();
    dsn.is_empty() || dsn == ":memory:" || dsn.starts_with("sqlite::memory:") || dsn.contains("mode=memory")
}

fn sqlite_url(dsn: &str) -> String {
    if is_memory(dsn) && !dsn.contains("mode=memory") {
        return "sqlite::memory:".to_string();
    }
    if dsn.starts_with("sqlite:") {
        dsn.to_string()
    } else {
        format!("sqlite://{}", dsn)
    }
}

fn mysql_url(dsn: &str) -> Result<String, ConfigError> {
    let (prefix, rest) = match dsn.rfind('/') {
        Some(slash) => (&dsn[..slash], &dsn[slash + 1..]),
        None => (dsn, ""),
    };
    let caps = MYSQL_PREFIX
        .captures(prefix)
        .ok_or_else(|| invalid(Engine::MySql, "expected user:password@net(addr)/dbname"))?;
    let (db_name, query) = match rest.split_once('?') {
        Some((db, q)) => (db, q),
        None => (rest, ""),
    };

    let mut url = String::from("mysql://");
    let user = caps.name("user").map(|m| m.as_str()).unwrap_or("");
    if !user.is_empty() {
        url.push_str(&percent_encode(user));
        if let Some(pass) = caps.name("pass") {
            url.push(':');
            url.push_str(&percent_encode(pass.as_str()));
        }
        url.push('@');
    }

    let net = caps.name("net").map(|m| m.as_str()).unwrap_or("tcp");
    let addr = caps.name("addr").map(|m| m.as_str()).unwrap_or("");
    let mut params: Vec<String> = Vec::new();
    if net == "unix" {
        url.push_str("localhost");
        if !addr.is_empty() {
            params.push(format!("socket={}", addr));
        }
    } else if addr.is_empty() {
        url.push_str(MYSQL_DEFAULT_ADDR);
    } else {
        url.push_str(addr);
    }

    url.push('/');
    url.push_str(db_name);
    params.extend(query.split('&').filter(|p| !p.is_empty()).map(str::to_string));
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
    Ok(url)
}

/// Percent-encode URL userinfo.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn invalid(engine: Engine, reason: &str) -> ConfigError {
    ConfigError::InvalidDsn {
        driver: engine.name().to_string(),
        reason: reason.to_string(),
    }
}
