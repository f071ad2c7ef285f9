//! Fixed lookup tables for the nested numbering scheme.
//!
//! `UTAB` spreads the 8 bits of a byte onto the even bit positions of a
//! 16-bit word; `CTAB` undoes an interleave of a byte, returning its even
//! bits in the low nibble and its odd bits in bits 8..12.

/// Bit-spreading table: bit `i` of the index lands on bit `2i`.
pub(crate) const UTAB: [u16; 256] = [
    0x0000, 0x0001, 0x0004, 0x0005, 0x0010, 0x0011, 0x0014, 0x0015,
    0x0040, 0x0041, 0x0044, 0x0045, 0x0050, 0x0051, 0x0054, 0x0055,
    0x0100, 0x0101, 0x0104, 0x0105, 0x0110, 0x0111, 0x0114, 0x0115,
    0x0140, 0x0141, 0x0144, 0x0145, 0x0150, 0x0151, 0x0154, 0x0155,
    0x0400, 0x0401, 0x0404, 0x0405, 0x0410, 0x0411, 0x0414, 0x0415,
    0x0440, 0x0441, 0x0444, 0x0445, 0x0450, 0x0451, 0x0454, 0x0455,
    0x0500, 0x0501, 0x0504, 0x0505, 0x0510, 0x0511, 0x0514, 0x0515,
    0x0540, 0x0541, 0x0544, 0x0545, 0x0550, 0x0551, 0x0554, 0x0555,
    0x1000, 0x1001, 0x1004, 0x1005, 0x1010, 0x1011, 0x1014, 0x1015,
    0x1040, 0x1041, 0x1044, 0x1045, 0x1050, 0x1051, 0x1054, 0x1055,
    0x1100, 0x1101, 0x1104, 0x1105, 0x1110, 0x1111, 0x1114, 0x1115,
    0x1140, 0x1141, 0x1144, 0x1145, 0x1150, 0x1151, 0x1154, 0x1155,
    0x1400, 0x1401, 0x1404, 0x1405, 0x1410, 0x1411, 0x1414, 0x1415,
    0x1440, 0x1441, 0x1444, 0x1445, 0x1450, 0x1451, 0x1454, 0x1455,
    0x1500, 0x1501, 0x1504, 0x1505, 0x1510, 0x1511, 0x1514, 0x1515,
    0x1540, 0x1541, 0x1544, 0x1545, 0x1550, 0x1551, 0x1554, 0x1555,
    0x4000, 0x4001, 0x4004, 0x4005, 0x4010, 0x4011, 0x4014, 0x4015,
    0x4040, 0x4041, 0x4044, 0x4045, 0x4050, 0x4051, 0x4054, 0x4055,
    0x4100, 0x4101, 0x4104, 0x4105, 0x4110, 0x4111, 0x4114, 0x4115,
    0x4140, 0x4141, 0x4144, 0x4145, 0x4150, 0x4151, 0x4154, 0x4155,
    0x4400, 0x4401, 0x4404, 0x4405, 0x4410, 0x4411, 0x4414, 0x4415,
    0x4440, 0x4441, 0x4444, 0x4445, 0x4450, 0x4451, 0x4454, 0x4455,
    0x4500, 0x4501, 0x4504, 0x4505, 0x4510, 0x4511, 0x4514, 0x4515,
    0x4540, 0x4541, 0x4544, 0x4545, 0x4550, 0x4551, 0x4554, 0x4555,
    0x5000, 0x5001, 0x5004, 0x5005, 0x5010, 0x5011, 0x5014, 0x5015,
    0x5040, 0x5041, 0x5044, 0x5045, 0x5050, 0x5051, 0x5054, 0x5055,
    0x5100, 0x5101, 0x5104, 0x5105, 0x5110, 0x5111, 0x5114, 0x5115,
    0x5140, 0x5141, 0x5144, 0x5145, 0x5150, 0x5151, 0x5154, 0x5155,
    0x5400, 0x5401, 0x5404, 0x5405, 0x5410, 0x5411, 0x5414, 0x5415,
    0x5440, 0x5441, 0x5444, 0x5445, 0x5450, 0x5451, 0x5454, 0x5455,
    0x5500, 0x5501, 0x5504, 0x5505, 0x5510, 0x5511, 0x5514, 0x5515,
    0x5540, 0x5541, 0x5544, 0x5545, 0x5550, 0x5551, 0x5554, 0x5555,
];

/// Bit-compacting table: even bits to `0..4`, odd bits to `8..12`.
pub(crate) const CTAB: [u16; 256] = [
    0x0000, 0x0001, 0x0100, 0x0101, 0x0002, 0x0003, 0x0102, 0x0103,
    0x0200, 0x0201, 0x0300, 0x0301, 0x0202, 0x0203, 0x0302, 0x0303,
    0x0004, 0x0005, 0x0104, 0x0105, 0x0006, 0x0007, 0x0106, 0x0107,
    0x0204, 0x0205, 0x0304, 0x0305, 0x0206, 0x0207, 0x0306, 0x0307,
    0x0400, 0x0401, 0x0500, 0x0501, 0x0402, 0x0403, 0x0502, 0x0503,
    0x0600, 0x0601, 0x0700, 0x0701, 0x0602, 0x0603, 0x0702, 0x0703,
    0x0404, 0x0405, 0x0504, 0x0505, 0x0406, 0x0407, 0x0506, 0x0507,
    0x0604, 0x0605, 0x0704, 0x0705, 0x0606, 0x0607, 0x0706, 0x0707,
    0x0008, 0x0009, 0x0108, 0x0109, 0x000a, 0x000b, 0x010a, 0x010b,
    0x0208, 0x0209, 0x0308, 0x0309, 0x020a, 0x020b, 0x030a, 0x030b,
    0x000c, 0x000d, 0x010c, 0x010d, 0x000e, 0x000f, 0x010e, 0x010f,
    0x020c, 0x020d, 0x030c, 0x030d, 0x020e, 0x020f, 0x030e, 0x030f,
    0x0408, 0x0409, 0x0508, 0x0509, 0x040a, 0x040b, 0x050a, 0x050b,
    0x0608, 0x0609, 0x0708, 0x0709, 0x060a, 0x060b, 0x070a, 0x070b,
    0x040c, 0x040d, 0x050c, 0x050d, 0x040e, 0x040f, 0x050e, 0x050f,
    0x060c, 0x060d, 0x070c, 0x070d, 0x060e, 0x060f, 0x070e, 0x070f,
    0x0800, 0x0801, 0x0900, 0x0901, 0x0802, 0x0803, 0x0902, 0x0903,
    0x0a00, 0x0a01, 0x0b00, 0x0b01, 0x0a02, 0x0a03, 0x0b02, 0x0b03,
    0x0804, 0x0805, 0x0904, 0x0905, 0x0806, 0x0807, 0x0906, 0x0907,
    0x0a04, 0x0a05, 0x0b04, 0x0b05, 0x0a06, 0x0a07, 0x0b06, 0x0b07,
    0x0c00, 0x0c01, 0x0d00, 0x0d01, 0x0c02, 0x0c03, 0x0d02, 0x0d03,
    0x0e00, 0x0e01, 0x0f00, 0x0f01, 0x0e02, 0x0e03, 0x0f02, 0x0f03,
    0x0c04, 0x0c05, 0x0d04, 0x0d05, 0x0c06, 0x0c07, 0x0d06, 0x0d07,
    0x0e04, 0x0e05, 0x0f04, 0x0f05, 0x0e06, 0x0e07, 0x0f06, 0x0f07,
    0x0808, 0x0809, 0x0908, 0x0909, 0x080a, 0x080b, 0x090a, 0x090b,
    0x0a08, 0x0a09, 0x0b08, 0x0b09, 0x0a0a, 0x0a0b, 0x0b0a, 0x0b0b,
    0x080c, 0x080d, 0x090c, 0x090d, 0x080e, 0x080f, 0x090e, 0x090f,
    0x0a0c, 0x0a0d, 0x0b0c, 0x0b0d, 0x0a0e, 0x0a0f, 0x0b0e, 0x0b0f,
    0x0c08, 0x0c09, 0x0d08, 0x0d09, 0x0c0a, 0x0c0b, 0x0d0a, 0x0d0b,
    0x0e08, 0x0e09, 0x0f08, 0x0f09, 0x0e0a, 0x0e0b, 0x0f0a, 0x0f0b,
    0x0c0c, 0x0c0d, 0x0d0c, 0x0d0d, 0x0c0e, 0x0c0f, 0x0d0e, 0x0d0f,
    0x0e0c, 0x0e0d, 0x0f0c, 0x0f0d, 0x0e0e, 0x0e0f, 0x0f0e, 0x0f0f,
];

/// Ring index of the southernmost corner of each base face, in units of `nside`.
pub(crate) const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];

/// Longitude index of each base face centre, in units of `pi/4`.
pub(crate) const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

/// Step in face-local x for each of the 8 neighbour directions.
pub(crate) const X_OFFSET: [i64; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];

/// Step in face-local y for each of the 8 neighbour directions.
pub(crate) const Y_OFFSET: [i64; 8] = [0, 1, 1, 1, 0, -1, -1, -1];

/// Face reached when leaving a face in a given direction.
///
/// Rows are indexed by the 3x3 direction cell (`S, SE, E, SW, centre, NE, W,
/// NW, N`), columns by the starting face. `-1` marks a direction with no
/// adjacent face (the corners where only three faces meet).
pub(crate) const FACE_ARRAY: [[i8; 12]; 9] = [
    [8, 9, 10, 11, -1, -1, -1, -1, 10, 11, 8, 9],
    [5, 6, 7, 4, 8, 9, 10, 11, 9, 10, 11, 8],
    [-1, -1, -1, -1, 5, 6, 7, 4, -1, -1, -1, -1],
    [4, 5, 6, 7, 11, 8, 9, 10, 11, 8, 9, 10],
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    [1, 2, 3, 0, 0, 1, 2, 3, 5, 6, 7, 4],
    [-1, -1, -1, -1, 7, 4, 5, 6, -1, -1, -1, -1],
    [3, 0, 1, 2, 3, 0, 1, 2, 4, 5, 6, 7],
    [2, 3, 0, 1, -1, -1, -1, -1, 0, 1, 2, 3],
];

/// Coordinate fix-up when crossing into the neighbouring face.
///
/// Indexed by direction cell and face row (`face >> 2`). Bit 1 mirrors x,
/// bit 2 mirrors y, bit 4 transposes.
pub(crate) const SWAP_ARRAY: [[u8; 3]; 9] = [
    [0, 0, 3],
    [0, 0, 6],
    [0, 0, 0],
    [0, 0, 5],
    [0, 0, 0],
    [5, 0, 0],
    [0, 0, 0],
    [6, 0, 0],
    [3, 0, 0],
];
