//! Process exit codes. Part of the CLI contract.

use igenbench_core::RunErrorKind;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1; // Provider, network or unexpected failure
pub const FILE_NOT_FOUND: i32 = 2; // Info file, image or question bank missing
pub const INVALID_INPUT: i32 = 3; // Bad arguments, malformed item, missing API key

pub fn for_kind(kind: &RunErrorKind) -> i32 {
    match kind {
        RunErrorKind::NotFound => FILE_NOT_FOUND,
        RunErrorKind::InvalidInput => INVALID_INPUT,
        _ => FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_contract_codes() {
        assert_eq!(for_kind(&RunErrorKind::NotFound), 2);
        assert_eq!(for_kind(&RunErrorKind::InvalidInput), 3);
        assert_eq!(for_kind(&RunErrorKind::ProviderRateLimit), 1);
        assert_eq!(for_kind(&RunErrorKind::Other), 1);
    }
}
