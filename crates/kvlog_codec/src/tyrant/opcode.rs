//! Tyrant command opcodes.

use std::fmt;

macro_rules! opcodes {
    ($($variant:ident = $byte:literal => $name:literal,)*) => {
        /// Opcode of a Tyrant command.
        ///
        /// Only [`Opcode::Put`], [`Opcode::PutKeep`] and [`Opcode::Misc`] have
        /// their fields decoded; the rest are recognized by name only.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $(
                #[doc = concat!("`", $name, "` (", stringify!($byte), ").")]
                $variant,
            )*
            /// A byte outside the opcode table.
            Unknown(u8),
        }

        impl Opcode {
            /// Maps a wire byte to an opcode.
            #[must_use]
            pub fn from_byte(byte: u8) -> Self {
                match byte {
                    $($byte => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }

            /// The wire byte of this opcode.
            #[must_use]
            pub fn as_byte(self) -> u8 {
                match self {
                    $(Self::$variant => $byte,)*
                    Self::Unknown(byte) => byte,
                }
            }

            /// Lowercase command name, `"unknown"` outside the table.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                    Self::Unknown(_) => "unknown",
                }
            }
        }
    };
}

opcodes! {
    Put = 0x10 => "put",
    PutKeep = 0x11 => "putkeep",
    PutCat = 0x12 => "putcat",
    PutShl = 0x13 => "putshl",
    PutNr = 0x18 => "putnr",
    Out = 0x20 => "out",
    Get = 0x30 => "get",
    MGet = 0x31 => "mget",
    VSiz = 0x38 => "vsiz",
    IterInit = 0x50 => "iterinit",
    IterNext = 0x51 => "iternext",
    FwmKeys = 0x58 => "fwmkeys",
    AddInt = 0x60 => "addint",
    AddDouble = 0x61 => "adddouble",
    Ext = 0x68 => "ext",
    Sync = 0x70 => "sync",
    Optimize = 0x71 => "optimize",
    Vanish = 0x72 => "vanish",
    Copy = 0x73 => "copy",
    Restore = 0x74 => "restore",
    SetMst = 0x78 => "setmst",
    RNum = 0x80 => "rnum",
    Size = 0x81 => "size",
    Stat = 0x88 => "stat",
    Misc = 0x90 => "misc",
    Repl = 0xA0 => "repl",
}

impl Opcode {
    /// Returns `true` for opcodes in the Tyrant table.
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Returns `true` if this decoder understands the opcode's fields.
    #[must_use]
    pub fn is_decoded(self) -> bool {
        matches!(self, Self::Put | Self::PutKeep | Self::Misc)
    }
}

impl From<u8> for Opcode {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(byte) => write!(f, "unknown({byte:#04x})"),
            known => f.write_str(known.name()),
        }
    }
}
