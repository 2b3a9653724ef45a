//! The full operation-code catalogue, matching the wire dissector's
//! `packettypenames` table byte for byte. Not every code listed here
//! has a body type implemented in [`crate::body`] — codes the client
//! binding never issues (node-protocol and optional verbs) decode
//! their header fine; this crate simply has no payload codec for them.

/// A single MAGMA operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    GetAttr = 1,
    ReadLink = 2,
    GetDir = 3,
    MkNod = 4,
    MkDir = 5,
    Unlink = 6,
    RmDir = 7,
    SymLink = 8,
    Rename = 9,
    Link = 10,
    Chmod = 11,
    Chown = 12,
    Truncate = 13,
    Utime = 14,
    Open = 15,
    Read = 16,
    Write = 17,
    StatFs = 18,
    Flush = 19,
    Release = 20,
    FSync = 21,
    SetXAttr = 22,
    GetXAttr = 23,
    ListXAttr = 24,
    RemoveXAttr = 25,
    OpenDir = 26,
    ReadDir = 27,
    ReleaseDir = 28,
    FSyncDir = 29,
    Init = 30,
    Destroy = 31,
    ReadDirExtended = 32,
    ReadDirOffset = 33,

    AddFlareToParent = 50,
    RemoveFlareFromParent = 51,

    FOpenDir = 60,
    FCloseDir = 61,
    FTellDir = 62,
    FSeekDir = 63,
    FReadDir = 64,

    Join = 100,
    FinishJoin = 101,
    TransmitTopology = 105,
    TransmitKey = 110,
    TransmitNode = 112,
    GetKey = 113,
    PutKey = 114,
    DropKey = 115,
    GetKeyContent = 116,
    NetworkBuilt = 117,

    CloseConnection = 252,
    Shutdown = 253,
    Heartbeat = 254,
}

impl OpCode {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        use OpCode::*;
        Ok(match value {
            1 => GetAttr,
            2 => ReadLink,
            3 => GetDir,
            4 => MkNod,
            5 => MkDir,
            6 => Unlink,
            7 => RmDir,
            8 => SymLink,
            9 => Rename,
            10 => Link,
            11 => Chmod,
            12 => Chown,
            13 => Truncate,
            14 => Utime,
            15 => Open,
            16 => Read,
            17 => Write,
            18 => StatFs,
            19 => Flush,
            20 => Release,
            21 => FSync,
            22 => SetXAttr,
            23 => GetXAttr,
            24 => ListXAttr,
            25 => RemoveXAttr,
            26 => OpenDir,
            27 => ReadDir,
            28 => ReleaseDir,
            29 => FSyncDir,
            30 => Init,
            31 => Destroy,
            32 => ReadDirExtended,
            33 => ReadDirOffset,
            50 => AddFlareToParent,
            51 => RemoveFlareFromParent,
            60 => FOpenDir,
            61 => FCloseDir,
            62 => FTellDir,
            63 => FSeekDir,
            64 => FReadDir,
            100 => Join,
            101 => FinishJoin,
            105 => TransmitTopology,
            110 => TransmitKey,
            112 => TransmitNode,
            113 => GetKey,
            114 => PutKey,
            115 => DropKey,
            116 => GetKeyContent,
            117 => NetworkBuilt,
            252 => CloseConnection,
            253 => Shutdown,
            254 => Heartbeat,
            other => return Err(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_code() {
        for code in [
            OpCode::GetAttr,
            OpCode::ReadDirExtended,
            OpCode::TransmitTopology,
            OpCode::Heartbeat,
        ] {
            assert_eq!(OpCode::try_from(code.as_u8()).unwrap(), code);
        }
    }

    #[test]
    fn unknown_code_fails_closed() {
        assert_eq!(OpCode::try_from(200), Err(200));
    }
}
