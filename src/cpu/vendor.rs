//! Vendor classification of cpuinfo blocks and ARM part lookup tables.
//!
//! x86 kernels describe a processor with `vendor_id`, ARM kernels with
//! `CPU implementer` / `CPU part` / `CPU variant`. Each block is turned into a
//! [`ParsedBlock`] tagged with the vendor family so the topology builder can
//! dispatch on the tag instead of re-inspecting keys.

use std::collections::BTreeSet;

use super::tokenizer::split_fields;

/// Model name used when an ARM implementer/part pair is not in [`ARM_MODELS`].
pub const UNKNOWN_MODEL: &str = "Unknown Model";

/// Vendor name used for blocks that name no vendor at all.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Known ARM implementer codes (`CPU implementer` field).
pub const ARM_IMPLEMENTERS: &[(&str, &str)] = &[
    ("0x41", "ARM"),
    ("0x42", "Broadcom"),
    ("0x43", "Cavium"),
    ("0x44", "DEC"),
    ("0x4e", "NVIDIA"),
    ("0x50", "APM"),
    ("0x51", "Qualcomm"),
    ("0x53", "Samsung"),
    ("0x54", "Texas Instruments"),
    ("0x56", "Marvell"),
    ("0x66", "Faraday"),
    ("0x69", "Intel"),
];

/// Core models per implementer, keyed by the `CPU part` field.
pub const ARM_MODELS: &[(&str, &[(&str, &str)])] = &[
    (
        "0x41",
        &[
            ("0x810", "ARM810"),
            ("0x920", "ARM920"),
            ("0x922", "ARM922"),
            ("0x926", "ARM926"),
            ("0x940", "ARM940"),
            ("0x946", "ARM946"),
            ("0x966", "ARM966"),
            ("0xa20", "ARM1020"),
            ("0xa22", "ARM1022"),
            ("0xa26", "ARM1026"),
            ("0xb02", "ARM11 MPCore"),
            ("0xb36", "ARM1136"),
            ("0xb56", "ARM1156"),
            ("0xb76", "ARM1176"),
            ("0xc05", "Cortex-A5"),
            ("0xc07", "Cortex-A7"),
            ("0xc08", "Cortex-A8"),
            ("0xc09", "Cortex-A9"),
            ("0xc0d", "Cortex-A17 (Original A12)"),
            ("0xc0e", "Cortex-A17"),
            ("0xc0f", "Cortex-A15"),
            ("0xc14", "Cortex-R4"),
            ("0xc15", "Cortex-R5"),
            ("0xc17", "Cortex-R7"),
            ("0xc18", "Cortex-R8"),
            ("0xc20", "Cortex-M0"),
            ("0xc21", "Cortex-M1"),
            ("0xc23", "Cortex-M3"),
            ("0xc24", "Cortex-M4"),
            ("0xc27", "Cortex-M7"),
            ("0xc60", "Cortex-M0+"),
            ("0xd01", "Cortex-A32"),
            ("0xd03", "Cortex-A53"),
            ("0xd04", "Cortex-A35"),
            ("0xd05", "Cortex-A55"),
            ("0xd07", "Cortex-A57"),
            ("0xd08", "Cortex-A72"),
            ("0xd09", "Cortex-A73"),
            ("0xd0a", "Cortex-A75"),
            ("0xd0b", "Cortex-A76"),
            ("0xd0c", "Neoverse-N1"),
            ("0xd0d", "Cortex-A77"),
            ("0xd13", "Cortex-R52"),
            ("0xd20", "Cortex-M23"),
            ("0xd21", "Cortex-M33"),
            ("0xd40", "Neoverse-V1"),
            ("0xd41", "Cortex-A78"),
            ("0xd42", "Cortex-A78AE"),
            ("0xd44", "Cortex-X1"),
            ("0xd46", "Cortex-A510"),
            ("0xd47", "Cortex-A710"),
            ("0xd48", "Cortex-X2"),
            ("0xd49", "Neoverse-N2"),
            ("0xd4a", "Neoverse-E1"),
            ("0xd4b", "Cortex-A78C"),
            ("0xd4d", "Cortex-A715"),
        ],
    ),
    (
        "0x42",
        &[
            ("0x00f", "Brahma B15"),
            ("0x100", "Brahma B53"),
            ("0x516", "ThunderX2"),
        ],
    ),
    (
        "0x43",
        &[
            ("0x0a0", "ThunderX"),
            ("0x0a1", "ThunderX 88XX"),
            ("0x0a2", "ThunderX 81XX"),
            ("0x0a3", "ThunderX 83XX"),
            ("0x0af", "ThunderX2 99xx"),
        ],
    ),
    ("0x44", &[("0xa10", "SA110"), ("0xa11", "SA1100")]),
    ("0x4e", &[("0x000", "Denver"), ("0x003", "Denver 2")]),
    ("0x50", &[("0x000", "X-Gene")]),
    (
        "0x51",
        &[
            ("0x00f", "Scorpion"),
            ("0x02d", "Scorpion"),
            ("0x04d", "Krait"),
            ("0x06f", "Krait"),
            ("0x201", "Kryo"),
            ("0x205", "Kryo"),
            ("0x211", "Kryo"),
            ("0x800", "Falkor V1/Kryo"),
            ("0x801", "Kryo V2"),
            ("0x802", "Kryo 3xx gold"),
            ("0x803", "Kryo 3xx silver"),
            ("0x804", "Kryo 4xx/5xx gold"),
            ("0x805", "Kryo 4xx/5xx silver"),
            ("0xc00", "Falkor"),
            ("0xc01", "Saphira"),
        ],
    ),
    ("0x53", &[("0x001", "Exynos-m1")]),
    // Texas Instruments: no parts listed
    ("0x54", &[]),
    (
        "0x56",
        &[
            ("0x131", "Feroceon 88FR131"),
            ("0x581", "PJ4/PJ4b"),
            ("0x584", "PJ4B-MP"),
        ],
    ),
    ("0x66", &[("0x526", "FA526"), ("0x626", "FA626")]),
    (
        "0x69",
        &[
            ("0x200", "i80200"),
            ("0x210", "PXA250A"),
            ("0x212", "PXA210A"),
            ("0x242", "i80321-400"),
            ("0x243", "i80321-600"),
            ("0x290", "PXA250B/PXA26x"),
            ("0x292", "PXA210B"),
            ("0x2c2", "i80321-400-B0"),
            ("0x2c3", "i80321-600-B0"),
            ("0x2d0", "PXA250C/PXA255/PXA26x"),
            ("0x2d2", "PXA210C"),
            ("0x2e3", "i80219"),
            ("0x411", "PXA27x"),
            ("0x41c", "IPX425-533"),
            ("0x41d", "IPX425-400"),
            ("0x41f", "IPX425-266"),
            ("0x682", "PXA32x"),
            ("0x683", "PXA930/PXA935"),
            ("0x688", "PXA30x"),
            ("0x689", "PXA31x"),
            ("0xb11", "SA1110"),
            ("0xc12", "IPX1200"),
        ],
    ),
];

/// Normalizes an implementer code to the `0x`-prefixed lowercase table key.
pub fn implementer_key(code: &str) -> String {
    let code = code.trim();
    let digits = code
        .strip_prefix("0x")
        .or_else(|| code.strip_prefix("0X"))
        .unwrap_or(code);
    format!("0x{}", digits.to_ascii_lowercase())
}

/// Resolves an implementer code to a vendor name, if known.
pub fn implementer_name(code: &str) -> Option<&'static str> {
    let key = implementer_key(code);
    ARM_IMPLEMENTERS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}

/// Resolves an ARM implementer/part pair to a core model name.
///
/// Unknown implementers and unknown parts both yield [`UNKNOWN_MODEL`].
pub fn arm_model_name(implementer: &str, part_hex: &str) -> &'static str {
    let key = implementer_key(implementer);
    let part = part_hex.trim().to_ascii_lowercase();

    ARM_MODELS
        .iter()
        .find(|(k, _)| *k == key)
        .and_then(|(_, parts)| parts.iter().find(|(p, _)| *p == part))
        .map(|(_, model)| *model)
        .unwrap_or(UNKNOWN_MODEL)
}

/// Fields shared by every vendor family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonFields {
    /// `processor`: logical processor index.
    pub processor: Option<i64>,
    pub vendor: String,
    pub model_name: String,
    /// `flags` (x86) or `Features` (ARM).
    pub flags: BTreeSet<String>,
}

/// An x86-style block, or a block with no vendor key at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageBlock {
    pub common: CommonFields,
    /// `physical id`: package/socket identity.
    pub physical_id: Option<i64>,
    /// `cache size`, converted from KB to bytes.
    pub cache_size_bytes: Option<u64>,
    /// `siblings`: logical cores in the package.
    pub siblings: Option<u32>,
    /// `cpu cores`: physical cores in the package.
    pub cpu_cores: Option<u32>,
}

/// An ARM block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArmBlock {
    pub common: CommonFields,
    /// Normalized `0x..` implementer code.
    pub implementer: String,
    pub variant: String,
    pub part: String,
}

impl ArmBlock {
    /// Identity triple used to tell core types apart.
    pub fn identity(&self) -> (String, String, String) {
        (
            self.implementer.clone(),
            self.variant.clone(),
            self.part.clone(),
        )
    }
}

/// A cpuinfo block tagged with its vendor family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedBlock {
    X86(PackageBlock),
    Arm(ArmBlock),
    Other(PackageBlock),
}

impl ParsedBlock {
    pub fn common(&self) -> &CommonFields {
        match self {
            ParsedBlock::X86(block) | ParsedBlock::Other(block) => &block.common,
            ParsedBlock::Arm(block) => &block.common,
        }
    }
}

/// Parses `"<N> KB"` into bytes.
fn parse_cache_size(value: &str) -> Option<u64> {
    let kb = value.split_whitespace().next()?.parse::<u64>().ok()?;
    kb.checked_mul(1024)
}

/// Classifies one cpuinfo block.
///
/// Returns `None` when the block carries no recognized key (e.g. the
/// `Hardware`/`Revision`/`Serial` trailer some ARM boards append).
pub fn classify(block: &str) -> Option<ParsedBlock> {
    let mut common = CommonFields::default();
    let mut package = PackageBlock::default();
    let mut implementer: Option<String> = None;
    let mut variant = String::new();
    let mut part = String::new();
    let mut vendor_id: Option<String> = None;
    let mut model_name: Option<String> = None;
    let mut recognized = false;

    for (name, value) in split_fields(block) {
        match name {
            "vendor_id" => vendor_id = Some(value.to_string()),
            "CPU implementer" => implementer = Some(implementer_key(value)),
            "CPU part" => part = value.to_ascii_lowercase(),
            "CPU variant" => variant = value.to_string(),
            "processor" => common.processor = value.parse().ok(),
            "model name" | "Processor" => model_name = Some(value.to_string()),
            "cache size" => package.cache_size_bytes = parse_cache_size(value),
            "siblings" => package.siblings = value.parse().ok(),
            "cpu cores" => package.cpu_cores = value.parse().ok(),
            "flags" | "Features" => {
                common.flags = value.split_whitespace().map(str::to_string).collect();
            }
            "physical id" => package.physical_id = value.parse().ok(),
            _ => continue,
        }
        recognized = true;
    }

    if !recognized {
        return None;
    }

    if let Some(implementer) = implementer {
        common.vendor = match implementer_name(&implementer) {
            Some(name) => name.to_string(),
            None => format!("Unknown Vendor ({implementer})"),
        };
        common.model_name = if part.is_empty() {
            UNKNOWN_MODEL.to_string()
        } else {
            arm_model_name(&implementer, &part).to_string()
        };
        return Some(ParsedBlock::Arm(ArmBlock {
            common,
            implementer,
            variant,
            part,
        }));
    }

    common.model_name = model_name.unwrap_or_default();
    match vendor_id {
        Some(vendor) => {
            common.vendor = vendor;
            package.common = common;
            Some(ParsedBlock::X86(package))
        }
        None => {
            common.vendor = UNKNOWN_VENDOR.to_string();
            package.common = common;
            Some(ParsedBlock::Other(package))
        }
    }
}
