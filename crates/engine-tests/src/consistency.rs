#[cfg(test)]
mod tests {
    use crate::{
        memory::{CallCounters, MemoryDataSource, MemoryTable, ScriptedFailure},
        utils::{
            ORDER_TABLE, checksum_param, failing_source, memory_source, order_param, order_row,
            order_table,
        },
    };
    use connectors::sql::base::adapter::DatabaseType;
    use engine_core::{
        consistency::{
            algorithm::{
                DataConsistencyCalculateAlgorithm, SingleCalculateAlgorithm,
                StreamingCalculateAlgorithm,
                crc32::Crc32MatchAlgorithm,
                data_match::{CHUNK_SIZE_KEY, DEFAULT_CHUNK_SIZE, DataMatchAlgorithm},
            },
            checker::{DataConsistencyChecker, TableCheckTask},
            factory::{AlgorithmKind, create_algorithm},
            parameter::DataConsistencyCalculateParameter,
            result::CalculatedResult,
        },
        error::{ConsistencyError, LoadingFailureCause},
    };
    use futures::TryStreamExt;
    use model::{core::value::Value, execution::properties::AlgorithmProperties};
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn chunked(size: usize) -> DataMatchAlgorithm {
        let props: AlgorithmProperties = [(CHUNK_SIZE_KEY, size.to_string())].into_iter().collect();
        DataMatchAlgorithm::new(&props)
    }

    #[traced_test]
    #[tokio::test]
    async fn test_has_next_computes_chunk_once() {
        let source = memory_source(DatabaseType::MySql, order_table(5));
        let counters = source.counters();
        let algorithm = chunked(2);
        let mut param = order_param(&source);

        let mut chunks = algorithm.calculate(&mut param);
        assert!(chunks.has_next().await.unwrap());
        assert!(chunks.has_next().await.unwrap());
        assert_eq!(CallCounters::get(&counters.open_cursors), 1);
        assert_eq!(CallCounters::get(&counters.rows_fetched), 2);

        let first = chunks.next().await.unwrap().unwrap();
        assert_eq!(first.records_count(), 2);
        assert_eq!(CallCounters::get(&counters.rows_fetched), 2);

        let rest = chunks.into_stream().try_collect::<Vec<_>>().await.unwrap();
        assert_eq!(
            rest.iter().map(|c| c.records_count()).collect::<Vec<_>>(),
            vec![2, 1]
        );
        assert_eq!(CallCounters::get(&counters.open_cursors), 1);
        assert_eq!(CallCounters::get(&counters.cursor_closes), 1);
        assert_eq!(CallCounters::get(&counters.connection_closes), 1);
        assert!(param.calculation_context.is_none());
    }

    #[traced_test]
    #[tokio::test]
    async fn test_resumes_after_last_checkpoint() {
        let source = memory_source(DatabaseType::MySql, order_table(5));
        let algorithm = chunked(3);

        let mut param = order_param(&source);
        let first = algorithm.calculate_chunk(&mut param).await.unwrap().unwrap();
        assert_eq!(first.checkpoint(), Some(&Value::Int(3)));
        assert_eq!(param.checkpoint, Some(Value::Int(3)));
        param.close_context().await;

        // A fresh session picks up strictly after the saved checkpoint.
        let mut resumed = order_param(&source).with_checkpoint(Value::Int(3));
        let second = algorithm.calculate_chunk(&mut resumed).await.unwrap().unwrap();
        let ids = second
            .records()
            .iter()
            .map(|row| row[0].clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![Value::Int(4), Value::Int(5)]);
        assert!(algorithm.calculate_chunk(&mut resumed).await.unwrap().is_none());

        let (sql, params) = source.statements().last().cloned().unwrap();
        assert!(sql.contains("`order_id` > ?"), "{sql}");
        assert_eq!(params, vec![Value::Int(3)]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_upper_bound_limits_scan() {
        let source = memory_source(DatabaseType::Postgres, order_table(10));
        let algorithm = chunked(100);
        let mut param = order_param(&source)
            .with_checkpoint(Value::Int(2))
            .with_upper_bound(Value::Int(6));

        let chunk = algorithm.calculate_chunk(&mut param).await.unwrap().unwrap();
        assert_eq!(chunk.records_count(), 4);
        assert_eq!(chunk.checkpoint(), Some(&Value::Int(6)));

        let (sql, params) = source.statements().remove(0);
        assert!(sql.contains("\"order_id\" > $1 AND \"order_id\" <= $2"), "{sql}");
        assert_eq!(params, vec![Value::Int(2), Value::Int(6)]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_cancel_between_chunks_fails_and_closes() {
        let source = memory_source(DatabaseType::MySql, order_table(6));
        let counters = source.counters();
        let algorithm = chunked(2);
        let mut param = order_param(&source);

        assert!(algorithm.calculate_chunk(&mut param).await.unwrap().is_some());
        algorithm.cancel();

        let err = algorithm.calculate_chunk(&mut param).await.unwrap_err();
        assert!(err.is_canceled(), "{err}");
        match err {
            ConsistencyError::LoadingFailure { table, cause } => {
                assert_eq!(table.to_string(), ORDER_TABLE);
                assert!(matches!(cause, LoadingFailureCause::Canceled));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(param.calculation_context.is_none());
        assert_eq!(CallCounters::get(&counters.cursor_closes), 1);
        assert_eq!(CallCounters::get(&counters.connection_closes), 1);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_cancel_at_chunk_boundary_is_not_exhaustion() {
        let source = memory_source(DatabaseType::MySql, order_table(4));
        let counters = source.counters();
        let algorithm = chunked(2);
        let mut param = order_param(&source);

        assert!(algorithm.calculate_chunk(&mut param).await.unwrap().is_some());
        assert!(algorithm.calculate_chunk(&mut param).await.unwrap().is_some());
        algorithm.cancel();

        let err = algorithm.calculate_chunk(&mut param).await.unwrap_err();
        assert!(err.is_canceled(), "{err}");
        assert_eq!(CallCounters::get(&counters.rows_fetched), 4);
        assert!(param.calculation_context.is_none());
        assert_eq!(CallCounters::get(&counters.connection_closes), 1);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_cancel_before_first_chunk_skips_io() {
        let source = memory_source(DatabaseType::MySql, order_table(3));
        let counters = source.counters();
        let algorithm = chunked(2);
        let mut param = order_param(&source);
        algorithm.cancel();

        let mut chunks = algorithm.calculate(&mut param);
        let err = chunks.has_next().await.unwrap_err();
        assert!(err.is_canceled(), "{err}");
        assert_eq!(CallCounters::get(&counters.connects), 0);
        assert_eq!(CallCounters::get(&counters.open_cursors), 0);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_row_match_database_types() {
        let source = memory_source(DatabaseType::OpenGauss, order_table(3));
        let chunk = chunked(10)
            .calculate_chunk(&mut order_param(&source))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chunk.records_count(), 3);

        let source = memory_source(DatabaseType::Other("oracle".into()), order_table(3));
        let counters = source.counters();
        let err = chunked(10)
            .calculate_chunk(&mut order_param(&source))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsistencyError::Unsupported(_)), "{err}");
        assert_eq!(CallCounters::get(&counters.connects), 0);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_read_failure_closes_context_and_ends_sequence() {
        let source = failing_source(
            DatabaseType::MySql,
            order_table(10),
            ScriptedFailure::AfterRows(3),
        );
        let counters = source.counters();
        let algorithm = chunked(2);
        let mut param = order_param(&source);

        let mut chunks = algorithm.calculate(&mut param);
        assert!(chunks.next().await.unwrap().is_some());
        let err = chunks.next().await.unwrap_err();
        assert!(matches!(
            err,
            ConsistencyError::LoadingFailure {
                cause: LoadingFailureCause::Db(_),
                ..
            }
        ));
        assert!(chunks.is_failed());
        assert!(!chunks.has_next().await.unwrap());
        assert_eq!(CallCounters::get(&counters.connection_closes), 1);
        assert!(logs_contain("Chunk calculation failed"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_cursor_failure_releases_connection() {
        let source = failing_source(
            DatabaseType::MySql,
            order_table(3),
            ScriptedFailure::OpenCursor,
        );
        let counters = source.counters();
        let mut param = order_param(&source);

        let err = chunked(10).calculate_chunk(&mut param).await.unwrap_err();
        assert!(matches!(err, ConsistencyError::LoadingFailure { .. }));
        assert_eq!(CallCounters::get(&counters.connects), 1);
        assert_eq!(CallCounters::get(&counters.connection_closes), 1);
        assert!(param.calculation_context.is_none());
    }

    #[traced_test]
    #[tokio::test]
    async fn test_close_failure_is_only_logged() {
        let source = failing_source(DatabaseType::MySql, order_table(2), ScriptedFailure::Close);
        let mut param = order_param(&source);
        let algorithm = chunked(10);

        assert!(algorithm.calculate_chunk(&mut param).await.unwrap().is_some());
        assert!(algorithm.calculate_chunk(&mut param).await.unwrap().is_none());
        assert!(logs_contain("Failed to close calculation connection"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_invalid_chunk_size_uses_default() {
        for raw in ["0", "-5", "not-a-number"] {
            let props: AlgorithmProperties = [(CHUNK_SIZE_KEY, raw)].into_iter().collect();
            let algorithm = create_algorithm("DATA_MATCH", &props).unwrap();
            let AlgorithmKind::DataMatch(algorithm) = algorithm else {
                panic!("expected DATA_MATCH");
            };
            assert_eq!(algorithm.chunk_size(), DEFAULT_CHUNK_SIZE);
        }
        assert!(logs_contain("Invalid chunk-size"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_missing_unique_key_is_unsupported() {
        let source = memory_source(DatabaseType::MySql, order_table(3));
        let counters = source.counters();
        let mut param = checksum_param(&source);

        let err = chunked(10).calculate_chunk(&mut param).await.unwrap_err();
        assert!(matches!(err, ConsistencyError::Unsupported(_)));
        assert_eq!(CallCounters::get(&counters.connects), 0);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_checksums_match_for_equal_tables() {
        let source = memory_source(DatabaseType::MySql, order_table(4));
        let target = memory_source(DatabaseType::MySql, order_table(4));
        let algorithm = Crc32MatchAlgorithm::new();

        let source_result = algorithm.calculate(&mut checksum_param(&source)).await.unwrap();
        let target_result = algorithm.calculate(&mut checksum_param(&target)).await.unwrap();
        assert_eq!(source_result.len(), 1);
        assert_eq!(source_result, target_result);
        assert_eq!(source_result[0].records_count, 4);
        assert_eq!(source_result[0].column_checksums.len(), 4);

        let counters = source.counters();
        assert_eq!(CallCounters::get(&counters.queries), 4);
        assert_eq!(CallCounters::get(&counters.connects), 1);
        assert_eq!(CallCounters::get(&counters.connection_closes), 1);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_checksum_detects_changed_value() {
        let mut changed = order_table(4);
        changed.rows[2][2] = Value::from("REFUNDED");
        let source = memory_source(DatabaseType::MySql, order_table(4));
        let target = memory_source(DatabaseType::MySql, changed);
        let algorithm = Crc32MatchAlgorithm::new();

        let a = algorithm.calculate(&mut checksum_param(&source)).await.unwrap();
        let b = algorithm.calculate(&mut checksum_param(&target)).await.unwrap();
        assert_eq!(a[0].records_count, b[0].records_count);
        assert_eq!(a[0].column_checksums[0], b[0].column_checksums[0]);
        assert_ne!(a, b);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_checksum_of_empty_table_is_zero() {
        let empty = MemoryTable::new(["order_id"], "order_id");
        let source = memory_source(DatabaseType::MySql, empty);
        let mut param = order_param(&source).with_columns(["order_id"]);
        let result = Crc32MatchAlgorithm::new().calculate(&mut param).await.unwrap();
        assert_eq!(result[0].records_count, 0);
        assert_eq!(result[0].column_checksums, vec![0]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_checksum_rejects_unsupported_database_before_io() {
        let source = memory_source(DatabaseType::Postgres, order_table(2));
        let counters = source.counters();
        let err = Crc32MatchAlgorithm::new()
            .calculate(&mut checksum_param(&source))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsistencyError::Unsupported(_)));

        // Supported on paper, but the dialect has no checksum function.
        let err = Crc32MatchAlgorithm::with_supported_database_types(vec![DatabaseType::Postgres])
            .calculate(&mut checksum_param(&source))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsistencyError::Unsupported(_)));
        assert_eq!(CallCounters::get(&counters.connects), 0);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_checksum_cancel_stops_before_query() {
        let source = memory_source(DatabaseType::MySql, order_table(3));
        let counters = source.counters();
        let algorithm = Crc32MatchAlgorithm::new();
        algorithm.cancel();

        let err = algorithm.calculate(&mut checksum_param(&source)).await.unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(CallCounters::get(&counters.queries), 0);
        assert_eq!(CallCounters::get(&counters.connection_closes), 1);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_checker_matches_across_driver_widths() {
        // Target stores user_id as BIGINT, source as INT.
        let widened = MemoryTable::new(["order_id", "user_id", "status", "created"], "order_id")
            .with_rows((1..=7).map(|id| {
                let mut row = order_row(id);
                row[1] = Value::Int(id % 7);
                row
            }));
        let source = memory_source(DatabaseType::MySql, order_table(7));
        let target = memory_source(DatabaseType::Postgres, widened);

        let props: AlgorithmProperties = "chunk-size=3".parse().unwrap();
        let checker = DataConsistencyChecker::new(create_algorithm("DATA_MATCH", &props).unwrap());
        let result = checker
            .check(&mut order_param(&source), &mut order_param(&target))
            .await
            .unwrap();

        assert!(result.is_matched(), "{result:?}");
        assert_eq!(result.count.source, 7);
        assert_eq!(result.count.target, 7);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_checker_stops_at_first_mismatch() {
        let mut changed = order_table(9);
        changed.rows[1][2] = Value::from("LOST");
        let source = memory_source(DatabaseType::MySql, order_table(9));
        let target = memory_source(DatabaseType::MySql, changed);
        let target_counters = target.counters();

        let props: AlgorithmProperties = "chunk-size=3".parse().unwrap();
        let checker = DataConsistencyChecker::new(create_algorithm("data_match", &props).unwrap());
        let mut source_param = order_param(&source);
        let mut target_param = order_param(&target);
        let result = checker.check(&mut source_param, &mut target_param).await.unwrap();

        assert!(!result.content.matched);
        assert!(!result.is_matched());
        assert_eq!(result.count.source, 3);
        assert_eq!(result.count.target, 3);
        assert_eq!(CallCounters::get(&target_counters.rows_fetched), 3);
        assert!(source_param.calculation_context.is_none());
        assert!(target_param.calculation_context.is_none());
        assert!(logs_contain("Content mismatch"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_checker_reports_missing_rows_as_count_mismatch() {
        let source = memory_source(DatabaseType::MySql, order_table(5));
        let target = memory_source(DatabaseType::MySql, order_table(3));

        let checker =
            DataConsistencyChecker::new(create_algorithm("DATA_MATCH", &AlgorithmProperties::new()).unwrap());
        let result = checker
            .check(&mut order_param(&source), &mut order_param(&target))
            .await
            .unwrap();

        assert!(!result.count.matched);
        assert!(!result.content.matched);
        assert_eq!((result.count.source, result.count.target), (5, 3));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_check_tables_runs_each_table() {
        let matching = memory_source(DatabaseType::MySql, order_table(4));
        let matching_target = memory_source(DatabaseType::MySql, order_table(4));

        let items = MemoryTable::new(["item_id", "order_id"], "item_id")
            .with_rows((1..=3).map(|id| vec![Value::Int(id), Value::Int(id)]));
        let mut drifted = items.clone();
        drifted.rows.pop();
        let item_source = memory_source(DatabaseType::MySql, items);
        let item_target = memory_source(DatabaseType::MySql, drifted);

        let item_param = |source: &Arc<MemoryDataSource>| {
            DataConsistencyCalculateParameter::new("t_order_item", source.clone())
                .with_columns(["item_id", "order_id"])
        };

        let checker =
            DataConsistencyChecker::new(create_algorithm("CRC32_MATCH", &AlgorithmProperties::new()).unwrap());
        let results = checker
            .check_tables(vec![
                TableCheckTask {
                    source: checksum_param(&matching),
                    target: checksum_param(&matching_target),
                },
                TableCheckTask {
                    source: item_param(&item_source),
                    target: item_param(&item_target),
                },
            ])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[ORDER_TABLE].is_matched());
        assert!(!results["t_order_item"].count.matched);

        let report = serde_json::to_value(&results).unwrap();
        assert_eq!(report["t_order"]["content"]["matched"], true);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_checker_propagates_loading_failure() {
        let source = memory_source(DatabaseType::MySql, order_table(3));
        let target = failing_source(DatabaseType::MySql, order_table(3), ScriptedFailure::Connect);

        let checker =
            DataConsistencyChecker::new(create_algorithm("DATA_MATCH", &AlgorithmProperties::new()).unwrap());
        let mut source_param = order_param(&source);
        let err = checker
            .check(&mut source_param, &mut order_param(&target))
            .await
            .unwrap_err();

        assert!(matches!(err, ConsistencyError::LoadingFailure { .. }));
        assert!(source_param.calculation_context.is_none());
    }
}
