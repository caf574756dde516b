use crate::{
    consistency::algorithm::{
        DataConsistencyCalculateAlgorithm,
        crc32::{CRC32_MATCH, Crc32MatchAlgorithm},
        data_match::{DATA_MATCH, DataMatchAlgorithm},
    },
    error::ConsistencyError,
};
use connectors::sql::base::adapter::DatabaseType;
use model::execution::properties::AlgorithmProperties;
use serde::Serialize;
use tracing::info;

/// An algorithm chosen at runtime by its type name.
pub enum AlgorithmKind {
    Crc32Match(Crc32MatchAlgorithm),
    DataMatch(DataMatchAlgorithm),
}

impl AlgorithmKind {
    pub fn algorithm_type(&self) -> &'static str {
        match self {
            AlgorithmKind::Crc32Match(a) => a.algorithm_type(),
            AlgorithmKind::DataMatch(a) => a.algorithm_type(),
        }
    }

    pub fn supported_database_types(&self) -> Vec<DatabaseType> {
        match self {
            AlgorithmKind::Crc32Match(a) => a.supported_database_types(),
            AlgorithmKind::DataMatch(a) => a.supported_database_types(),
        }
    }

    pub fn cancel(&self) {
        match self {
            AlgorithmKind::Crc32Match(a) => a.cancel(),
            AlgorithmKind::DataMatch(a) => a.cancel(),
        }
    }

    pub fn is_canceling(&self) -> bool {
        match self {
            AlgorithmKind::Crc32Match(a) => a.is_canceling(),
            AlgorithmKind::DataMatch(a) => a.is_canceling(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmDescriptor {
    #[serde(rename = "type")]
    pub algorithm_type: &'static str,
    pub supported_database_types: Vec<DatabaseType>,
    pub description: &'static str,
}

/// Creates an algorithm by case-insensitive type name.
pub fn create_algorithm(
    type_name: &str,
    props: &AlgorithmProperties,
) -> Result<AlgorithmKind, ConsistencyError> {
    let algorithm = match type_name.trim().to_uppercase().as_str() {
        CRC32_MATCH => AlgorithmKind::Crc32Match(Crc32MatchAlgorithm::new()),
        DATA_MATCH => AlgorithmKind::DataMatch(DataMatchAlgorithm::new(props)),
        _ => return Err(ConsistencyError::UnsupportedAlgorithm(type_name.to_string())),
    };
    info!(algorithm = algorithm.algorithm_type(), "Created consistency algorithm");
    Ok(algorithm)
}

pub fn supported_algorithms() -> Vec<AlgorithmDescriptor> {
    let defaults = AlgorithmProperties::new();
    vec![
        AlgorithmDescriptor {
            algorithm_type: CRC32_MATCH,
            supported_database_types: Crc32MatchAlgorithm::new().supported_database_types(),
            description: "Match CRC32 of records.",
        },
        AlgorithmDescriptor {
            algorithm_type: DATA_MATCH,
            supported_database_types: DataMatchAlgorithm::new(&defaults).supported_database_types(),
            description: "Match raw data of records.",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let algorithm = create_algorithm("data_match", &AlgorithmProperties::new()).unwrap();
        assert_eq!(algorithm.algorithm_type(), DATA_MATCH);
        let algorithm = create_algorithm(" Crc32_Match ", &AlgorithmProperties::new()).unwrap();
        assert_eq!(algorithm.algorithm_type(), CRC32_MATCH);
        assert_eq!(algorithm.supported_database_types(), vec![DatabaseType::MySql]);
    }

    #[test]
    fn test_unknown_algorithm() {
        let result = create_algorithm("MD5_MATCH", &AlgorithmProperties::new());
        assert!(matches!(result, Err(ConsistencyError::UnsupportedAlgorithm(name)) if name == "MD5_MATCH"));
    }

    #[test]
    fn test_cancel_reaches_inner_algorithm() {
        let algorithm = create_algorithm(DATA_MATCH, &AlgorithmProperties::new()).unwrap();
        algorithm.cancel();
        assert!(algorithm.is_canceling());
    }

    #[test]
    fn test_supported_algorithms_listing() {
        let types = supported_algorithms()
            .into_iter()
            .map(|d| d.algorithm_type)
            .collect::<Vec<_>>();
        assert_eq!(types, vec![CRC32_MATCH, DATA_MATCH]);
    }
}
