//! The set of authentication methods a server advertises, and its
//! conversions to and from the wire's comma-separated name-list.

use bitflags::bitflags;

bitflags! {
    /// Which of `{password, publicKey, hostBased}` a server is willing to accept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AvailableMethods: u8 {
        /// The `password` authentication method.
        const PASSWORD = 1 << 0;

        /// The `publickey` authentication method.
        const PUBLIC_KEY = 1 << 1;

        /// The `hostbased` authentication method.
        const HOST_BASED = 1 << 2;
    }
}

impl AvailableMethods {
    /// Render as the ordered `[password, publickey, hostbased]` wire list,
    /// filtered to the members actually present.
    pub fn to_wire(self) -> Vec<String> {
        [
            (Self::PASSWORD, "password"),
            (Self::PUBLIC_KEY, "publickey"),
            (Self::HOST_BASED, "hostbased"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name.to_string())
        .collect()
    }

    /// Parse from the wire's name-list. Unknown tokens are ignored, not errors.
    pub fn from_wire(names: &[String]) -> Self {
        names.iter().fold(Self::empty(), |acc, name| {
            acc | match name.as_str() {
                "password" => Self::PASSWORD,
                "publickey" => Self::PUBLIC_KEY,
                "hostbased" => Self::HOST_BASED,
                _ => Self::empty(),
            }
        })
    }
}
