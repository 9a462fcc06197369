use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{info, warn};

/// One named account and its plaintext secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// The 47 counties plus the diaspora entry.
const DEFAULT_ROSTER: &[(&str, &str)] = &[
    ("Mombasa", "jE5r!"),
    ("Kwale", "Rp.8EC"),
    ("Kilifi", "a<H5XD"),
    ("Tana River", "SK-e2W"),
    ("Lamu", "Gt7)u$"),
    ("Taita Taveta", "Vv;3hz"),
    ("Garissa", "H7 c4B"),
    ("Wajir", "bP5E C"),
    ("Mandera", "B$g5q."),
    ("Marsabit", "q^)U5E"),
    ("Isiolo", "K$[t5?"),
    ("Meru", "PT%4:A"),
    ("Tharaka-Nithi", "w4M!#H"),
    ("Embu", "kS8 td"),
    ("Kitui", "p7!^R$"),
    ("Machakos", "w@QX9;"),
    ("Makueni", "y4#uV2"),
    ("Nyandarua", "wTm9P"),
    ("Nyeri", "b9Tn=."),
    ("Kirinyaga", "N*s9jL"),
    ("Murang'a", "F57k#Z"),
    ("Kiambu", "a+T\"2]"),
    ("Turkana", "c9WA+("),
    ("West Pokot", "B8u-E"),
    ("Samburu", "R]8y7D"),
    ("Trans-Nzoia", "xZ%5w+"),
    ("Uasin Gishu", "B7d^vL"),
    ("Elgeyo-Marakwet", "c8E-g="),
    ("Nandi", "H3Qb)G"),
    ("Baringo", "Dg=Q9("),
    ("Laikipia", "Ac5&,6"),
    ("Nakuru", "dc2[Uw"),
    ("Narok", "m{4eJF"),
    ("Kajiado", "kG5<wj"),
    ("Kericho", "t9sL&"),
    ("Bomet", "DB6u;"),
    ("Kakamega", "h3W$fp"),
    ("Vihiga", "Ry*?8D"),
    ("Bungoma", "e}7Myk"),
    ("Busia", "zt5Pu"),
    ("Siaya", "m6_7YE"),
    ("Kisumu", "jx5Z;"),
    ("Homa Bay", "Kyg8#*"),
    ("Migori", "r7JV/8"),
    ("Kisii", "v;G_3x"),
    ("Nyamira", "r4`=X>"),
    ("Nairobi", "at:9ZF"),
    ("Diaspora", "h}U2Na"),
];

pub fn default_roster() -> Vec<Account> {
    DEFAULT_ROSTER
        .iter()
        .map(|(username, password)| Account::new(*username, *password))
        .collect()
}

/// Read a JSON array of accounts. A missing file falls back to the built-in roster.
pub fn load_from_file(path: &Path) -> Result<Vec<Account>, GateError> {
    if !path.exists() {
        info!(path = %path.display(), "roster file not found; using built-in roster");
        return Ok(default_roster());
    }

    let contents = fs::read_to_string(path)?;
    let accounts: Vec<Account> = serde_json::from_str(&contents)?;
    let accounts: Vec<Account> = accounts
        .into_iter()
        .filter(|a| {
            let keep = !a.username.is_empty();
            if !keep {
                warn!(path = %path.display(), "skipping roster entry with empty username");
            }
            keep
        })
        .collect();

    info!(path = %path.display(), count = accounts.len(), "loaded roster from file");
    Ok(accounts)
}

/// Resolve the roster to seed from: the configured file, or the built-in list.
pub fn resolve(path: Option<&Path>) -> Result<Vec<Account>, GateError> {
    match path {
        Some(p) => load_from_file(p),
        None => Ok(default_roster()),
    }
}
