use std::{fs, path::Path};

use anyhow::anyhow;
use sable_consensus_beacon::versioned_state::{ForkName, VersionedBeaconState};
use snap::raw::{Decoder, Encoder};

/// Files ending in ``.ssz`` hold plain SSZ; anything else is snappy compressed.
fn is_plain_ssz(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "ssz")
}

pub fn read_state(path: &Path, fork_name: ForkName) -> anyhow::Result<VersionedBeaconState> {
    let contents =
        fs::read(path).map_err(|err| anyhow!("Failed to read {}: {err}", path.display()))?;
    let bytes = if is_plain_ssz(path) {
        contents
    } else {
        Decoder::new()
            .decompress_vec(&contents)
            .map_err(|err| anyhow!("Failed to decompress {}: {err}", path.display()))?
    };
    VersionedBeaconState::from_ssz_bytes(fork_name, &bytes)
}

pub fn write_state(path: &Path, state: &VersionedBeaconState) -> anyhow::Result<()> {
    let bytes = state.as_ssz_bytes();
    let contents = if is_plain_ssz(path) {
        bytes
    } else {
        Encoder::new().compress_vec(&bytes)?
    };
    fs::write(path, contents).map_err(|err| anyhow!("Failed to write {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use sable_consensus_beacon::dev_deposits::dev_genesis_state;
    use tempfile::tempdir;

    use super::*;

    #[rstest]
    #[case("genesis.ssz_snappy")]
    #[case("genesis.ssz")]
    fn test_state_file_round_trip(#[case] file_name: &str) {
        let directory = tempdir().expect("temp dir");
        let path = directory.path().join(file_name);
        let (state, _) = dev_genesis_state(8).expect("genesis");
        let state = VersionedBeaconState::Phase0(state);

        write_state(&path, &state).expect("write");
        let read_back = read_state(&path, ForkName::Phase0).expect("read");
        assert_eq!(read_back.tree_hash_root(), state.tree_hash_root());

        let on_disk = fs::read(&path).expect("file");
        assert_eq!(on_disk == state.as_ssz_bytes(), file_name.ends_with(".ssz"));
    }

    #[test]
    fn test_garbage_is_not_a_state() {
        let directory = tempdir().expect("temp dir");
        let path = directory.path().join("garbage.ssz_snappy");
        fs::write(&path, b"definitely not snappy").expect("write");
        assert!(read_state(&path, ForkName::Phase0).is_err());
        assert!(read_state(&directory.path().join("missing.ssz"), ForkName::Phase0).is_err());
    }
}
