use anp_etl::domain::model::{CAMPO, POCO};
use anp_etl::{
    apply_filter, CatalogDiscoverer, Cell, CleanTable, DatasetCleaner, DatasetFetcher, EtlEngine,
    EtlError, FilterCriteria, LocalStorage, ProductionPipeline, RawDataset, TomlConfig, YearEntry,
};
use calamine::{open_workbook, Data, Reader, Xlsx};
use httpmock::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

const LISTING: &str = r#"
<html><body>
  <h3>Produção em mar</h3>
  <ul>
    <li><a href="/arquivos/producao-mar-1941-1979.csv">1941-1979</a></li>
    <li><a href="/arquivos/producao-mar-1999.csv">1999</a></li>
    <li><a href="/arquivos/producao-mar-2023.csv">2023</a></li>
  </ul>
  <h3>Produção em terra</h3>
  <ul>
    <li><a href="/arquivos/producao-terra-2023.csv">2023</a></li>
  </ul>
  <a href="/arquivos/manual.pdf">Manual</a>
</body></html>"#;

const CSV_2023: &str = "[Ano];[Mês];[Estado];[Bacia];[Campo];[Poço];[Produção de Óleo (m³)];[Produção de Gás Associado (Mm³)];[Produção de Gás Não Associado (Mm³)];[Produção de Água (m³)]
2023;2;RJ;Santos;Búzios;7-BUZ-1-RJS;1.500,25;10,5;0;300
2023;1;RJ;Santos;Búzios;7-BUZ-1-RJS;1.000,00;5;0;100
2023;1;RJ;Santos;Búzios;9-BUZ-2-RJS;-;1;0;0
2023;1;RJ;Campos;Marlim Sul;MLS-10;250,5;2,5;0;500
2023;1;RJ;Campos;Marlim Sul
";

fn windows_1252(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(text);
    assert!(!had_errors);
    bytes.into_owned()
}

fn config(server: &MockServer, output_path: &str) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.source.listing_url = server.url("/anp/producao");
    config.load.output_path = output_path.to_string();
    config
}

fn read_sheet(path: &std::path::Path) -> calamine::Range<Data> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.worksheet_range("Sheet1").unwrap()
}

fn assert_sheet_matches(range: &calamine::Range<Data>, table: &CleanTable) {
    assert_eq!(range.height(), table.len() + 1);

    for (col, column) in table.columns.iter().enumerate() {
        assert_eq!(range.get((0, col)), Some(&Data::String(column.name.clone())));
    }

    for (row, record) in table.rows.iter().enumerate() {
        for (col, cell) in record.cells.iter().enumerate() {
            let expected = match cell {
                Cell::Text(s) => Data::String(s.clone()),
                Cell::Number(n) => Data::Float(*n),
                Cell::Missing => Data::Empty,
            };
            let actual = range.get((row + 1, col)).cloned().unwrap_or(Data::Empty);
            assert_eq!(actual, expected, "row {row}, column {}", table.columns[col].name);
        }
    }
}

#[tokio::test]
async fn test_discover_years_from_listing() {
    let server = MockServer::start();
    let listing_mock = server.mock(|when, then| {
        when.method(GET).path("/anp/producao");
        then.status(200)
            .header("Content-Type", "text/html; charset=utf-8")
            .body(LISTING);
    });

    let temp_dir = TempDir::new().unwrap();
    let config = config(&server, temp_dir.path().to_str().unwrap());

    let entries = CatalogDiscoverer::from_config(&config)
        .unwrap()
        .discover()
        .await
        .unwrap();

    listing_mock.assert();
    let years: Vec<i32> = entries.iter().map(|e| e.year).collect();
    assert_eq!(years, vec![2023, 1999, 1941]);
    assert_eq!(entries[0].source_url, server.url("/arquivos/producao-mar-2023.csv"));
    assert_eq!(entries[2].end_year, Some(1979));
}

#[tokio::test]
async fn test_listing_without_years_is_parse_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/anp/producao");
        then.status(200).body("<html><body>Página em manutenção</body></html>");
    });

    let config = config(&server, "./unused");
    let err = CatalogDiscoverer::from_config(&config)
        .unwrap()
        .discover()
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::ParseError { .. }));
}

#[tokio::test]
async fn test_listing_server_error_is_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/anp/producao");
        then.status(503);
    });

    let config = config(&server, "./unused");
    let err = CatalogDiscoverer::from_config(&config)
        .unwrap()
        .discover()
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::FetchError { .. }));
}

fn assert_timed_out(err: EtlError) {
    match err {
        EtlError::FetchError { reason, .. } => assert_eq!(reason, "request timed out"),
        other => panic!("expected FetchError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_portal_times_out_as_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/anp/producao");
        then.status(200).delay(Duration::from_secs(3)).body(LISTING);
    });
    server.mock(|when, then| {
        when.method(GET).path("/arquivos/producao-mar-2023.csv");
        then.status(200)
            .delay(Duration::from_secs(3))
            .body(windows_1252(CSV_2023));
    });

    let mut config = config(&server, "./unused");
    config.source.timeout_seconds = 1;

    let err = CatalogDiscoverer::from_config(&config)
        .unwrap()
        .discover()
        .await
        .unwrap_err();
    assert_timed_out(err);

    let entry = YearEntry {
        year: 2023,
        end_year: None,
        label: "2023".to_string(),
        source_url: server.url("/arquivos/producao-mar-2023.csv"),
    };
    let err = DatasetFetcher::from_config(&config)
        .unwrap()
        .fetch(&entry)
        .await
        .unwrap_err();
    assert_timed_out(err);
}

#[tokio::test]
async fn test_end_to_end_export_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/anp/producao");
        then.status(200).body(LISTING);
    });
    let csv_mock = server.mock(|when, then| {
        when.method(GET).path("/arquivos/producao-mar-2023.csv");
        then.status(200)
            .header("Content-Type", "text/csv")
            .body(windows_1252(CSV_2023));
    });

    let config = config(&server, &output_path);
    let entry = CatalogDiscoverer::from_config(&config)
        .unwrap()
        .find(2023)
        .await
        .unwrap();
    assert_eq!(entry.label, "2023");

    let criteria = FilterCriteria::new().with_campo("Búzios");
    let storage = LocalStorage::new(output_path.clone());
    let pipeline =
        ProductionPipeline::new(storage, config.clone(), entry.clone(), criteria.clone()).unwrap();

    let result = EtlEngine::new(pipeline).run().await.unwrap();
    csv_mock.assert();
    assert!(result.ends_with("producao_anp_2023.xlsx"));

    let full_path = std::path::Path::new(&output_path).join("producao_anp_2023.xlsx");
    assert!(full_path.exists());

    // 用同一份資料在記憶體中重建預期結果
    let raw = RawDataset {
        source_url: entry.source_url.clone(),
        bytes: windows_1252(CSV_2023),
        encoding: encoding_rs::WINDOWS_1252,
    };
    let expected = apply_filter(
        &DatasetCleaner::new(b';', Default::default(), true)
            .clean(&raw)
            .unwrap(),
        &criteria,
    );

    assert_eq!(expected.len(), 3);
    assert!(expected
        .rows
        .iter()
        .all(|r| r.cells[expected.column_index(CAMPO).unwrap()] == Cell::Text("Búzios".to_string())));
    assert!(expected.column_index("Estado").is_none());
    assert!(expected.column_index("Bacia").is_none());

    let range = read_sheet(&full_path);
    assert_sheet_matches(&range, &expected);

    // "-" is not a number and is left blank
    let wells: Vec<_> = (0..expected.len())
        .map(|i| expected.cell(i, POCO).unwrap().clone())
        .collect();
    assert_eq!(
        wells,
        vec![
            Cell::Text("7-BUZ-1-RJS".to_string()),
            Cell::Text("7-BUZ-1-RJS".to_string()),
            Cell::Text("9-BUZ-2-RJS".to_string()),
        ]
    );
    assert_eq!(expected.cell(2, "Produção de Óleo (m³)"), Some(&Cell::Missing));
    assert_eq!(expected.cell(1, "Np"), Some(&Cell::Number(2500.25)));
}

#[tokio::test]
async fn test_end_to_end_missing_columns_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/anp/producao");
        then.status(200).body(LISTING);
    });
    server.mock(|when, then| {
        when.method(GET).path("/arquivos/producao-mar-1999.csv");
        then.status(200).body("Ano;Mês;Instalação\n1999;1;P-18\n");
    });

    let config = config(&server, &output_path);
    let entry = CatalogDiscoverer::from_config(&config)
        .unwrap()
        .find(1999)
        .await
        .unwrap();

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = ProductionPipeline::new(storage, config, entry, FilterCriteria::new()).unwrap();
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    match err {
        EtlError::SchemaError { missing } => assert_eq!(missing, vec!["Campo", "Poço"]),
        other => panic!("expected SchemaError, got {other:?}"),
    }
    assert!(!std::path::Path::new(&output_path)
        .join("producao_anp_1999.xlsx")
        .exists());
}

#[tokio::test]
async fn test_find_year_inside_historical_range() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/anp/producao");
        then.status(200).body(LISTING);
    });

    let config = config(&server, "./unused");
    let discoverer = CatalogDiscoverer::from_config(&config).unwrap();

    let entry = discoverer.find(1950).await.unwrap();
    assert_eq!(entry.label, "1941-1979");

    let err = discoverer.find(1985).await.unwrap_err();
    assert!(matches!(err, EtlError::ParseError { .. }));
}
