use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the young-generation size, in GiB.
pub const GENERATION_SIZE: &str = "Xmn";
/// Key of the G1 pause-time goal, in milliseconds.
pub const MAX_GC_PAUSE: &str = "XX_MaxGCPauseMillis";
/// Key of the G1 heap region size, in MiB.
pub const HEAP_REGION_SIZE: &str = "XX_G1HeapRegionSize";
/// Key of the initial metaspace size, in MiB.
pub const METASPACE_SIZE: &str = "XX_MetaspaceSize";
/// Key of the maximum metaspace size, in MiB.
pub const MAX_METASPACE_SIZE: &str = "XX_MaxMetaspaceSize";

/// How a known flag is rendered on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagKind {
    /// `-server` or `-XX:+Name`
    Toggle,
    /// `-Xmn<N>G`
    GenerationSize,
    /// `-XX:Name=<N>`
    Millis,
    /// `-XX:Name=<N>m`
    Megabytes,
}

/// Known flags in command-line order. Anything else in the config is ignored.
const FLAGS: [(&str, FlagKind); 23] = [
    (GENERATION_SIZE, FlagKind::GenerationSize),
    ("server", FlagKind::Toggle),
    ("XX_UseG1GC", FlagKind::Toggle),
    (MAX_GC_PAUSE, FlagKind::Millis),
    (HEAP_REGION_SIZE, FlagKind::Megabytes),
    (METASPACE_SIZE, FlagKind::Megabytes),
    (MAX_METASPACE_SIZE, FlagKind::Megabytes),
    ("XX_UseZGC", FlagKind::Toggle),
    ("XX_UseShenandoahGC", FlagKind::Toggle),
    ("XX_DisableExplicitGC", FlagKind::Toggle),
    ("XX_UseStringDeduplication", FlagKind::Toggle),
    ("XX_AlwaysPreTouch", FlagKind::Toggle),
    ("XX_ParallelRefProcEnabled", FlagKind::Toggle),
    ("XX_UnlockExperimentalVMOptions", FlagKind::Toggle),
    ("XX_UseLargePages", FlagKind::Toggle),
    ("XX_UseTransparentHugePages", FlagKind::Toggle),
    ("XX_TieredCompilation", FlagKind::Toggle),
    ("XX_OptimizeStringConcat", FlagKind::Toggle),
    ("XX_UseCodeCacheFlushing", FlagKind::Toggle),
    ("XX_PerfDisableSharedMem", FlagKind::Toggle),
    ("XX_UseBiasedLocking", FlagKind::Toggle),
    ("XX_UseCompressedOops", FlagKind::Toggle),
    ("XX_UseCompressedClassPointers", FlagKind::Toggle),
];

const BASE_TOGGLES: [&str; 10] = [
    "server",
    "XX_UseG1GC",
    "XX_DisableExplicitGC",
    "XX_AlwaysPreTouch",
    "XX_ParallelRefProcEnabled",
    "XX_UseStringDeduplication",
    "XX_UnlockExperimentalVMOptions",
    "XX_TieredCompilation",
    "XX_UseCompressedOops",
    "XX_UseCompressedClassPointers",
];

/// Value of a single JVM flag in the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JvmArgValue {
    /// On/off switch
    Toggle(bool),
    /// Size, time or a choice from a fixed list
    Int(i64),
    /// Anything this version does not understand; kept so it round-trips
    Other(serde_json::Value),
}

/// JVM flags keyed by name, e.g. `XX_UseG1GC` or `Xmn`.
///
/// Keys use `_` where the command line uses `:`; `XX_UseG1GC = true`
/// becomes `-XX:+UseG1GC`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JvmArgs(BTreeMap<String, JvmArgValue>);

impl Default for JvmArgs {
    fn default() -> Self {
        let mut args = Self::empty();
        for name in BASE_TOGGLES {
            args.insert(name, JvmArgValue::Toggle(true));
        }
        args
    }
}

impl JvmArgs {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, name: &str) -> Option<&JvmArgValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: JvmArgValue) -> &mut Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recommended flags for a heap between `min_memory` and `max_memory` GiB.
    pub fn recommended(min_memory: u32, max_memory: u32) -> Self {
        let avg = (i64::from(min_memory) + i64::from(max_memory)) / 2;
        let mut args = Self::default();

        let (pause, region, metaspace, max_metaspace) = if avg <= 8 {
            (200, 8, 256, 512)
        } else if avg <= 16 {
            (130, 16, 256, 512)
        } else {
            args.insert("XX_UseLargePages", JvmArgValue::Toggle(true));
            (100, 32, 512, 1024)
        };

        args.insert(MAX_GC_PAUSE, JvmArgValue::Int(pause))
            .insert(HEAP_REGION_SIZE, JvmArgValue::Int(region))
            .insert(METASPACE_SIZE, JvmArgValue::Int(metaspace))
            .insert(MAX_METASPACE_SIZE, JvmArgValue::Int(max_metaspace))
            .insert(GENERATION_SIZE, JvmArgValue::Int((avg / 4).max(1)));
        args
    }

    /// Command-line form of the configured flags.
    ///
    /// Disabled toggles and zero values are left out; unknown names and
    /// values of the wrong type are skipped.
    pub fn flatten(&self) -> Vec<String> {
        FLAGS
            .iter()
            .filter_map(|(name, kind)| render(name, *kind, self.0.get(*name)?))
            .collect()
    }
}

fn render(name: &str, kind: FlagKind, value: &JvmArgValue) -> Option<String> {
    let xx = name.strip_prefix("XX_");

    match (kind, value) {
        (FlagKind::Toggle, JvmArgValue::Toggle(true)) => Some(match xx {
            Some(flag) => format!("-XX:+{}", flag),
            None => format!("-{}", name),
        }),
        (FlagKind::GenerationSize, JvmArgValue::Int(n)) if *n > 0 => Some(format!("-{}{}G", name, n)),
        (FlagKind::Millis, JvmArgValue::Int(n)) if *n > 0 => Some(format!("-XX:{}={}", xx?, n)),
        (FlagKind::Megabytes, JvmArgValue::Int(n)) if *n > 0 => Some(format!("-XX:{}={}m", xx?, n)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_kinds() {
        let mut args = JvmArgs::empty();
        args.insert("server", JvmArgValue::Toggle(true))
            .insert("XX_UseG1GC", JvmArgValue::Toggle(true))
            .insert("XX_UseZGC", JvmArgValue::Toggle(false))
            .insert(GENERATION_SIZE, JvmArgValue::Int(2))
            .insert(MAX_GC_PAUSE, JvmArgValue::Int(130))
            .insert(HEAP_REGION_SIZE, JvmArgValue::Int(16))
            .insert(MAX_METASPACE_SIZE, JvmArgValue::Int(0));

        assert_eq!(
            args.flatten(),
            vec![
                "-Xmn2G",
                "-server",
                "-XX:+UseG1GC",
                "-XX:MaxGCPauseMillis=130",
                "-XX:G1HeapRegionSize=16m",
            ]
        );
    }

    #[test]
    fn test_unknown_and_mistyped_keys_are_ignored() {
        let mut args = JvmArgs::empty();
        args.insert("XX_UseNUMA", JvmArgValue::Toggle(true))
            .insert("XX_UseG1GC", JvmArgValue::Int(1))
            .insert(METASPACE_SIZE, JvmArgValue::Other(serde_json::json!("256")));

        assert!(args.flatten().is_empty());
    }

    #[test]
    fn test_recommended_tiers() {
        let small = JvmArgs::recommended(4, 4);
        assert_eq!(small.get(MAX_GC_PAUSE), Some(&JvmArgValue::Int(200)));
        assert_eq!(small.get(GENERATION_SIZE), Some(&JvmArgValue::Int(1)));
        assert!(small.get("XX_UseLargePages").is_none());

        let medium = JvmArgs::recommended(8, 16);
        assert_eq!(medium.get(HEAP_REGION_SIZE), Some(&JvmArgValue::Int(16)));
        assert_eq!(medium.get(GENERATION_SIZE), Some(&JvmArgValue::Int(3)));

        let large = JvmArgs::recommended(32, 32);
        assert_eq!(large.get(MAX_METASPACE_SIZE), Some(&JvmArgValue::Int(1024)));
        assert_eq!(large.get("XX_UseLargePages"), Some(&JvmArgValue::Toggle(true)));
    }

    #[test]
    fn test_recommended_huge_heap() {
        let args = JvmArgs::recommended(u32::MAX, u32::MAX);
        assert_eq!(
            args.get(GENERATION_SIZE),
            Some(&JvmArgValue::Int(i64::from(u32::MAX) / 4))
        );
        assert_eq!(args.get(HEAP_REGION_SIZE), Some(&JvmArgValue::Int(32)));
    }
}
