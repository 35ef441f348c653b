//! # Privilegios del proceso
//! src/privilege.rs
//!
//! Si el servidor arranca como root (para poder escuchar en un puerto bajo),
//! baja a un usuario/grupo sin privilegios apenas el socket está escuchando.

use crate::error::ServerError;

/// `true` si el proceso corre como root
#[cfg(unix)]
pub fn is_elevated() -> bool {
    nix::unistd::getuid().is_root()
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
    false
}

/// Cambia primero el grupo y después el usuario.
///
/// El orden importa: sin root ya no se puede cambiar el grupo.
#[cfg(unix)]
pub fn drop_privileges(user_id: u32, group_id: u32) -> Result<(), ServerError> {
    use nix::unistd::{setgid, setuid, Gid, Uid};

    setgid(Gid::from_raw(group_id)).map_err(|errno| ServerError::Privilege {
        step: "setgid",
        source: errno.into(),
    })?;
    setuid(Uid::from_raw(user_id)).map_err(|errno| ServerError::Privilege {
        step: "setuid",
        source: errno.into(),
    })?;
    Ok(())
}

#[cfg(not(unix))]
pub fn drop_privileges(_user_id: u32, _group_id: u32) -> Result<(), ServerError> {
    Ok(())
}
