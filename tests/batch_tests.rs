use cfdix::{
    BatchItem, apply_statuses, extract_invoices, extract_payments, load_metadata,
    sort_chronologically,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn invoice_xml(fecha: &str, uuid: &str) -> Vec<u8> {
    format!(
        r#"<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4"
              xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital"
              Fecha="{fecha}" SubTotal="100.00" Total="116.00" TipoDeComprobante="I">
          <cfdi:Emisor Rfc="AAA010101AAA" Nombre="Emisor SA"/>
          <cfdi:Conceptos>
            <cfdi:Concepto Cantidad="1" ValorUnitario="100.00" Importe="100.00" Descripcion="Servicio"/>
          </cfdi:Conceptos>
          <cfdi:Complemento>
            <tfd:TimbreFiscalDigital UUID="{uuid}"/>
          </cfdi:Complemento>
        </cfdi:Comprobante>"#
    )
    .into_bytes()
}

fn item(name: &str, bytes: Vec<u8>) -> BatchItem {
    BatchItem::new(name, bytes)
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[test]
fn one_malformed_item_does_not_abort_the_batch() {
    let items = vec![
        item("f1.xml", invoice_xml("2024-03-03T00:00:00", "U-3")),
        item("f2.xml", invoice_xml("2024-01-01T00:00:00", "U-1")),
        item("f3.xml", b"<Comprobante><broken>".to_vec()),
        item("f4.xml", invoice_xml("2024-04-04T00:00:00", "U-4")),
        item("f5.xml", invoice_xml("2024-02-02T00:00:00", "U-2")),
    ];
    let (records, diagnostics) = extract_invoices(&items);

    assert_eq!(records.len(), 4);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].source, "f3.xml");

    // sorting is unaffected by the failed item
    let uuids: Vec<&str> = records.iter().map(|r| r.uuid.as_str()).collect();
    assert_eq!(uuids, vec!["U-1", "U-2", "U-3", "U-4"]);
}

#[test]
fn empty_batch_returns_empty_table_and_no_diagnostics() {
    let (records, diagnostics) = extract_invoices(&[]);
    assert!(records.is_empty());
    assert!(diagnostics.is_empty());
}

#[test]
fn payment_document_without_complement_is_a_soft_diagnostic() {
    let items = vec![item(
        "nopay.xml",
        br#"<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4"
              Fecha="2024-01-01T00:00:00" TipoDeComprobante="P"/>"#
            .to_vec(),
    )];
    let (records, diagnostics) = extract_payments(&items);
    assert!(records.is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].source, "nopay.xml");
}

// ---------------------------------------------------------------------------
// Chronological ordering
// ---------------------------------------------------------------------------

#[test]
fn dates_are_rendered_in_display_format_after_sorting() {
    let items = vec![item("a.xml", invoice_xml("2024-03-15T10:30:45", "U-1"))];
    let (records, _) = extract_invoices(&items);
    assert_eq!(records[0].issue_date, "2024-03-15 10:30:45");
}

#[test]
fn unparseable_dates_sort_first_and_are_kept_verbatim() {
    let items = vec![
        item("ok.xml", invoice_xml("2024-05-01T00:00:00", "U-OK")),
        item("bad.xml", invoice_xml("sin fecha", "U-BAD")),
    ];
    let (records, diagnostics) = extract_invoices(&items);
    assert!(diagnostics.is_empty());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].uuid, "U-BAD");
    assert_eq!(records[0].issue_date, "sin fecha");
    assert_eq!(records[1].issue_date, "2024-05-01 00:00:00");
}

#[test]
fn date_normalization_is_idempotent_across_reprocessing() {
    let items = vec![item("a.xml", invoice_xml("2024-03-15T10:30:45", "U-1"))];
    let (mut records, _) = extract_invoices(&items);
    let first_pass = records[0].issue_date.clone();
    sort_chronologically(&mut records);
    assert_eq!(records[0].issue_date, first_pass);
}

// ---------------------------------------------------------------------------
// Status join
// ---------------------------------------------------------------------------

#[test]
fn ledger_status_joins_by_uppercased_fingerprint() {
    let items = vec![
        item("a.xml", invoice_xml("2024-01-01T00:00:00", "aaa-1")),
        item("b.xml", invoice_xml("2024-01-02T00:00:00", "BBB-2")),
        item("c.xml", invoice_xml("2024-01-03T00:00:00", "CCC-3")),
    ];
    let (mut records, _) = extract_invoices(&items);

    let statuses = load_metadata("UUID|Estado\nAAA-1|Vigente\nBBB-2|Cancelado\n").unwrap();
    apply_statuses(&mut records, &statuses);

    assert_eq!(records[0].status, "Vigente");
    assert_eq!(records[1].status, "Cancelado");
    // absent from the ledger: untouched
    assert_eq!(records[2].status, "");
}

#[test]
fn empty_ledger_status_leaves_existing_value_untouched() {
    let items = vec![item("a.xml", invoice_xml("2024-01-01T00:00:00", "AAA-1"))];
    let (mut records, _) = extract_invoices(&items);
    records[0].status = "Previo".into();

    let statuses = load_metadata("UUID,Fecha\nAAA-1,2024-01-01\n").unwrap();
    apply_statuses(&mut records, &statuses);
    assert_eq!(records[0].status, "Previo");
}

#[test]
fn batch_records_keep_extracted_amounts() {
    let items = vec![item("a.xml", invoice_xml("2024-01-01T00:00:00", "U-1"))];
    let (records, _) = extract_invoices(&items);
    assert_eq!(records[0].amount, dec!(100.00));
    assert_eq!(records[0].total, dec!(116.00));
}
