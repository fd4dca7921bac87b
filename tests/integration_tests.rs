use anyhow::Result;
use fiscal_impact_analyzer::*;

fn analyze_csv(data: &str) -> Result<AnalysisOutcome> {
    let table = decode_table(data.as_bytes(), SourceFormat::Csv)?;
    Ok(analyze_table(&table)?)
}

#[test]
fn test_template_csv_end_to_end() -> Result<()> {
    let data = "\
Mês/Ano,Entradas (R$),Saídas (R$),Qtd. Notas Entrada,Qtd. Notas Saída,Observações
Janeiro/2025,\"10.000,50\",\"8.000,00\",5,4,
Fevereiro/2025,,,,,
";
    let outcome = analyze_csv(data)?;

    let records = &outcome.summary.monthly_records;
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].period_key, "2025-01");
    assert_eq!(records[0].display_label, "Janeiro/2025");
    assert_eq!(records[0].inbound_amount, 10000.50);
    assert_eq!(records[0].outbound_amount, 8000.00);
    assert_eq!(records[0].inbound_count, 5);
    assert_eq!(records[0].outbound_count, 4);

    assert_eq!(records[1].period_key, "2025-02");
    assert_eq!(records[1].inbound_amount, 0.0);
    assert_eq!(records[1].outbound_amount, 0.0);

    assert_eq!(outcome.summary.inbound_total, 10000.50);
    assert_eq!(outcome.summary.outbound_total, 8000.00);
    assert_eq!(outcome.summary.cbs_impact, 960.00);
    assert_eq!(outcome.summary.ibs_impact, 400.00);
    assert_eq!(outcome.summary.pension_impact, 200.01);
    assert_eq!(outcome.summary.net_impact, 1159.99);
    assert_eq!(outcome.summary.period_start, "2025-01");
    assert_eq!(outcome.summary.period_end, "2025-02");

    Ok(())
}

#[test]
fn test_analysis_is_deterministic() -> Result<()> {
    let data = "\
Mês/Ano,Entradas (R$),Saídas (R$),Qtd. Notas Entrada,Qtd. Notas Saída,Observações
Março/2025,\"110.000,00\",\"85.000,00\",52,48,
Janeiro/2025,\"100.000,00\",\"80.000,00\",50,45,
Fevereiro/2025,\"120.000,00\",\"95.000,00\",55,50,
";
    let first = analyze_csv(data)?.to_json()?;
    let second = analyze_csv(data)?.to_json()?;
    assert_eq!(first, second);

    Ok(())
}

#[test]
fn test_styled_template_preamble_is_ignored() -> Result<()> {
    // Exports of the styled template carry a title row, an instruction
    // row and a spacer above the real header.
    let data = "\
TEMPLATE DE FATURAMENTO MENSAL,,,,,
Preencha os dados abaixo com o faturamento mensal,,,,,
,,,,,
Mês/Ano,Entradas (R$),Saídas (R$),Qtd. Notas Entrada,Qtd. Notas Saída,Observações
Janeiro/2025,\"100.000,00\",\"80.000,00\",50,45,Exemplo
Fevereiro/2025,\"120.000,00\",\"95.000,00\",55,50,
";
    let outcome = analyze_csv(data)?;

    assert_eq!(outcome.summary.monthly_records.len(), 2);
    assert_eq!(outcome.summary.inbound_total, 220000.00);
    assert_eq!(outcome.summary.outbound_total, 175000.00);

    Ok(())
}

#[test]
fn test_header_only_table_yields_zeroed_full_year() -> Result<()> {
    let data = "Mês/Ano,Entradas (R$),Saídas (R$),Qtd. Notas Entrada,Qtd. Notas Saída,Observações\n";
    let outcome = analyze_csv(data)?;

    assert!(outcome.summary.monthly_records.is_empty());
    assert_eq!(outcome.summary.inbound_total, 0.0);
    assert_eq!(outcome.summary.outbound_total, 0.0);
    assert_eq!(outcome.summary.net_impact, 0.0);
    assert_eq!(outcome.summary.period_start, "2025-01-01");
    assert_eq!(outcome.summary.period_end, "2025-12-31");

    assert!(!outcome.sufficiency.sufficient);
    assert_eq!(outcome.sufficiency.confidence, ConfidenceLevel::Low);

    Ok(())
}

#[test]
fn test_footer_rows_do_not_abort_the_import() -> Result<()> {
    let data = "\
Mês/Ano,Entradas (R$),Saídas (R$),Qtd. Notas Entrada,Qtd. Notas Saída,Observações
Janeiro/2025,\"1.000,00\",\"500,00\",1,1,
Observações,,,,,
Instruções,,,,,
Fevereiro/2025,\"2.000,00\",\"800,00\",2,2,
";
    let outcome = analyze_csv(data)?;

    let records = &outcome.summary.monthly_records;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].period_key, "2025-01");
    assert_eq!(records[1].period_key, "2025-02");
    assert_eq!(outcome.summary.inbound_total, 3000.00);

    Ok(())
}

#[test]
fn test_unreadable_periods_are_kept_but_flagged() -> Result<()> {
    let data = "\
Mês/Ano,Entradas (R$),Saídas (R$),Qtd. Notas Entrada,Qtd. Notas Saída,Observações
Janeiro/2025,\"1.000,00\",\"500,00\",1,1,
primeiro trimestre,\"3.000,00\",\"900,00\",3,3,
";
    let outcome = analyze_csv(data)?;

    let records = &outcome.summary.monthly_records;
    assert_eq!(records.len(), 2);

    let flagged: Vec<_> = records.iter().filter(|r| r.period_inferred).collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].display_label, "primeiro trimestre");
    // Both rows still count toward the totals.
    assert_eq!(outcome.summary.inbound_total, 4000.00);

    Ok(())
}

#[test]
fn test_nonstandard_column_names_still_classify() -> Result<()> {
    let data = "\
Periodo,Faturamento R$,Despesas R$
01/2025,\"50.000,00\",\"20.000,00\"
02/2025,\"60.000,00\",\"25.000,00\"
";
    let outcome = analyze_csv(data)?;

    assert_eq!(outcome.summary.monthly_records.len(), 2);
    assert_eq!(outcome.summary.inbound_total, 110000.00);
    assert_eq!(outcome.summary.outbound_total, 45000.00);
    assert_eq!(outcome.summary.period_start, "2025-01");
    assert_eq!(outcome.summary.period_end, "2025-02");

    Ok(())
}

#[test]
fn test_missing_columns_name_the_culprits() {
    let data = "\
Mês/Ano,Qtd. Notas Entrada,Qtd. Notas Saída
Janeiro/2025,5,4
";
    let table = decode_table(data.as_bytes(), SourceFormat::Csv).unwrap();
    let err = analyze_table(&table).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("inbound amount"));
    assert!(message.contains("outbound amount"));
    assert!(message.contains("Qtd. Notas Entrada"));
}
