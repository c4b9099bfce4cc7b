use core::str::FromStr;

use serde::{Deserialize, Serialize};

use tenantgate_core::DomainError;

/// Role held by a user within a tenant.
///
/// The set is closed; the canonical spelling (`"Admin"`, `"Operador"`, ...) is
/// what the membership table stores and what goes over the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKey {
    Admin,
    Operador,
    Tecnico,
    Lectura,
    Supervisor,
    Contador,
    Visitante,
}

impl RoleKey {
    pub const ALL: [RoleKey; 7] = [
        RoleKey::Admin,
        RoleKey::Operador,
        RoleKey::Tecnico,
        RoleKey::Lectura,
        RoleKey::Supervisor,
        RoleKey::Contador,
        RoleKey::Visitante,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKey::Admin => "Admin",
            RoleKey::Operador => "Operador",
            RoleKey::Tecnico => "Tecnico",
            RoleKey::Lectura => "Lectura",
            RoleKey::Supervisor => "Supervisor",
            RoleKey::Contador => "Contador",
            RoleKey::Visitante => "Visitante",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, RoleKey::Admin)
    }
}

impl core::fmt::Display for RoleKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKey {
    type Err = DomainError;

    /// Exact, case-sensitive match on the canonical spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleKey::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown role key '{s}'")))
    }
}
