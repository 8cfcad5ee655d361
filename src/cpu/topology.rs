//! Builds one [`CpuRecord`] per physical entity out of cpuinfo blocks.
//!
//! x86 blocks are grouped by `physical id`. ARM blocks are grouped by their
//! (implementer, variant, part) triple and their core counts are filled in by
//! a reconciliation pass over the sysfs topology once all blocks are seen.

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use super::frequency::{max_clock_speed_mhz, regular_clock_speed_mhz};
use super::source::{read_integer, Sources};
use super::tokenizer::split_blocks;
use super::vendor::{classify, ArmBlock, PackageBlock, ParsedBlock};
use super::{Architecture, CpuRecord};

type ArmIdentity = (String, String, String);

/// Accumulates records across the blocks of one enumeration.
struct TopologyBuilder<'a> {
    sources: &'a Sources,
    records: Vec<CpuRecord>,
    /// `physical id` of the previous package block.
    last_package: Option<i64>,
    arm_detected: bool,
    /// ARM core types seen so far, with the order they were first seen in.
    arm_core_types: AHashMap<ArmIdentity, usize>,
    /// Logical processor indices of every ARM block.
    arm_processors: Vec<i64>,
}

impl<'a> TopologyBuilder<'a> {
    fn new(sources: &'a Sources) -> Self {
        Self {
            sources,
            records: Vec::new(),
            last_package: None,
            arm_detected: false,
            arm_core_types: AHashMap::new(),
            arm_processors: Vec::new(),
        }
    }

    fn push(&mut self, block: ParsedBlock) {
        match block {
            ParsedBlock::X86(package) => self.push_package(package, Architecture::X86),
            ParsedBlock::Other(package) => self.push_package(package, Architecture::Other),
            ParsedBlock::Arm(arm) => self.push_arm(arm),
        }
    }

    fn push_package(&mut self, package: PackageBlock, architecture: Architecture) {
        let id = package.physical_id.unwrap_or(0);
        if self.last_package == Some(id) {
            debug!(
                "Skipping processor {:?}: same package as previous block ({})",
                package.common.processor, id
            );
            return;
        }
        self.last_package = Some(id);

        let common = package.common;
        self.accept(CpuRecord {
            id,
            architecture,
            vendor: common.vendor,
            model_name: common.model_name,
            num_physical_cores: package.cpu_cores,
            num_logical_cores: package.siblings,
            cache_size_bytes: package.cache_size_bytes,
            flags: common.flags,
            max_clock_speed_mhz: 0,
            regular_clock_speed_mhz: 0,
        });
    }

    fn push_arm(&mut self, arm: ArmBlock) {
        self.arm_detected = true;
        let processor = arm
            .common
            .processor
            .unwrap_or(self.arm_processors.len() as i64);
        self.arm_processors.push(processor);

        let identity = arm.identity();
        let id = if self.arm_core_types.contains_key(&identity) {
            // Reuses the most recently added record, not the record of this
            // triple; interleaved core types can be misattributed.
            self.records.last().map_or(processor, |r| r.id)
        } else {
            let ordinal = self.arm_core_types.len();
            debug!(
                "New ARM core type #{} {:?} at processor {}",
                ordinal, identity, processor
            );
            self.arm_core_types.insert(identity, ordinal);
            processor
        };

        let common = arm.common;
        self.accept(CpuRecord {
            id,
            architecture: Architecture::Arm,
            vendor: common.vendor,
            model_name: common.model_name,
            num_physical_cores: None,
            num_logical_cores: None,
            cache_size_bytes: None,
            flags: common.flags,
            max_clock_speed_mhz: 0,
            regular_clock_speed_mhz: 0,
        });
    }

    fn accept(&mut self, mut candidate: CpuRecord) {
        if self.records.iter().any(|r| r.id == candidate.id) {
            debug!("Skipping duplicate CPU id {}", candidate.id);
            return;
        }

        candidate.max_clock_speed_mhz = max_clock_speed_mhz(self.sources, candidate.id);
        candidate.regular_clock_speed_mhz = regular_clock_speed_mhz(self.sources, candidate.id);
        debug!(
            "Added CPU id {} ({} {}), max {} MHz",
            candidate.id, candidate.vendor, candidate.model_name, candidate.max_clock_speed_mhz
        );
        self.records.push(candidate);
    }

    fn finish(mut self) -> Vec<CpuRecord> {
        if self.arm_detected {
            self.reconcile_arm();
        }
        self.records
    }

    /// Fills ARM core counts from the sysfs topology of every ARM processor.
    fn reconcile_arm(&mut self) {
        let core_ids: AHashSet<i64> = self
            .arm_processors
            .iter()
            .filter_map(|&processor| read_integer(&self.sources.core_id(processor)))
            .collect();

        let logical = self.arm_processors.len() as u32;
        let physical = if core_ids.is_empty() {
            logical
        } else {
            core_ids.len() as u32
        };
        debug!(
            "ARM reconciliation: {} physical / {} logical cores",
            physical, logical
        );

        for record in self
            .records
            .iter_mut()
            .filter(|r| r.architecture == Architecture::Arm)
        {
            record.num_physical_cores = Some(physical);
            record.num_logical_cores = Some(logical);
        }
    }
}

/// Builds CPU records from cpuinfo text. Sysfs reads go through `sources`.
pub fn build(text: &str, sources: &Sources) -> Vec<CpuRecord> {
    let mut builder = TopologyBuilder::new(sources);
    for block in split_blocks(text) {
        match classify(block) {
            Some(parsed) => builder.push(parsed),
            None => debug!("Ignoring cpuinfo block without recognized fields"),
        }
    }
    builder.finish()
}
