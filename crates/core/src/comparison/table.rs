use crate::client::RatesApi;
use crate::comparison::sort::{partition, sort_rows, SortColumn, SortSpec};
use crate::domain::locale::Language;
use crate::domain::rates::{ComparisonResponse, RateRow};
use crate::domain::term::MortgageTerm;
use crate::time::average_month::average_month_caption;
use serde::Serialize;

const FETCH_ERROR: &str = "Could not load rates. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub term: MortgageTerm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonView {
    pub term: MortgageTerm,
    pub average_month: Option<String>,
    pub sort: Option<SortSpec>,
    pub rows: Vec<RateRow>,
    pub no_data: Vec<RateRow>,
}

/// Only the latest fetch generation may write its outcome.
#[derive(Debug, Clone)]
pub struct ComparisonTable {
    term: MortgageTerm,
    data: Option<ComparisonResponse>,
    error: Option<String>,
    loading: bool,
    sort: Option<SortSpec>,
    generation: u64,
}

impl ComparisonTable {
    pub fn new(term: MortgageTerm) -> Self {
        Self {
            term,
            data: None,
            error: None,
            loading: false,
            sort: None,
            generation: 0,
        }
    }

    pub fn begin_fetch(&mut self, term: MortgageTerm) -> FetchTicket {
        self.term = term;
        self.loading = true;
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            term,
        }
    }

    pub fn reload(&mut self) -> FetchTicket {
        self.begin_fetch(self.term)
    }

    /// Returns `false` when the ticket was superseded and the outcome dropped.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: anyhow::Result<ComparisonResponse>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                term = %ticket.term,
                generation = ticket.generation,
                latest = self.generation,
                "discarding superseded comparison response"
            );
            return false;
        }

        self.loading = false;
        match outcome {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(term = %ticket.term, error = %err, "comparison fetch failed");
                self.data = None;
                self.error = Some(FETCH_ERROR.to_string());
            }
        }
        true
    }

    pub async fn load(&mut self, api: &dyn RatesApi, term: MortgageTerm) -> bool {
        let ticket = self.begin_fetch(term);
        tracing::debug!(service = api.service_name(), %term, generation = ticket.generation, "loading comparison");
        let outcome = api.fetch_comparison(term).await;
        self.complete_fetch(ticket, outcome)
    }

    pub fn click_header(&mut self, column: SortColumn) -> SortSpec {
        let spec = SortSpec::select(self.sort, column);
        self.sort = Some(spec);
        spec
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
    }

    pub fn term(&self) -> MortgageTerm {
        self.term
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn data(&self) -> Option<&ComparisonResponse> {
        self.data.as_ref()
    }

    pub fn view(&self, language: Language) -> Option<ComparisonView> {
        let data = self.data.as_ref()?;
        let sorted = match self.sort {
            Some(spec) => sort_rows(&data.rows, spec, language),
            None => data.rows.clone(),
        };
        let split = partition(sorted);

        Some(ComparisonView {
            term: self.term,
            average_month: average_month_caption(
                data.average_month,
                data.average_month_formatted.as_deref(),
                language,
            ),
            sort: self.sort,
            rows: split.primary,
            no_data: split.no_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::sort::SortDirection;
    use crate::domain::contract::{AssessmentRequest, AssessmentResponse};
    use chrono::NaiveDate;

    fn row(bank: &str, list: Option<f64>) -> RateRow {
        RateRow {
            bank_name: bank.to_string(),
            list_rate: list,
            change: None,
            average_rate: None,
            last_changed: None,
        }
    }

    fn response(rows: Vec<RateRow>) -> ComparisonResponse {
        ComparisonResponse {
            average_month: NaiveDate::from_ymd_opt(2025, 10, 1),
            average_month_formatted: None,
            rows,
        }
    }

    #[test]
    fn stale_response_does_not_overwrite_newer_one() {
        let mut table = ComparisonTable::new(MortgageTerm::Variable3M);
        let slow = table.begin_fetch(MortgageTerm::Fixed1Y);
        let fast = table.begin_fetch(MortgageTerm::Fixed5Y);

        assert!(table.complete_fetch(fast, Ok(response(vec![row("Five", Some(3.8))]))));
        assert!(!table.complete_fetch(slow, Ok(response(vec![row("One", Some(3.1))]))));

        assert_eq!(table.term(), MortgageTerm::Fixed5Y);
        assert_eq!(table.data().unwrap().rows[0].bank_name, "Five");
        assert!(!table.is_loading());
    }

    #[test]
    fn stale_failure_does_not_clear_newer_rows() {
        let mut table = ComparisonTable::new(MortgageTerm::Variable3M);
        let old = table.begin_fetch(MortgageTerm::Fixed1Y);
        let new = table.reload();
        table.complete_fetch(new, Ok(response(vec![row("A", Some(3.0))])));
        table.complete_fetch(old, Err(anyhow::anyhow!("timeout")));
        assert!(table.error().is_none());
        assert!(table.data().is_some());
    }

    #[test]
    fn failure_clears_rows_and_sets_generic_error() {
        let mut table = ComparisonTable::new(MortgageTerm::Fixed2Y);
        let t = table.reload();
        table.complete_fetch(t, Ok(response(vec![row("A", Some(3.0))])));
        let t = table.reload();
        assert!(table.is_loading());
        table.complete_fetch(t, Err(anyhow::anyhow!("HTTP 500")));

        assert!(table.data().is_none());
        assert!(table.view(Language::Sv).is_none());
        assert_eq!(table.error(), Some(FETCH_ERROR));
    }

    #[test]
    fn view_sorts_then_partitions_and_formats_caption() {
        let mut table = ComparisonTable::new(MortgageTerm::Fixed3Y);
        let t = table.reload();
        table.complete_fetch(
            t,
            Ok(response(vec![
                row("X", None),
                row("Y", Some(3.5)),
                row("Z", Some(3.9)),
            ])),
        );

        let unsorted = table.view(Language::En).unwrap();
        assert_eq!(unsorted.rows[0].bank_name, "Y");
        assert_eq!(unsorted.average_month.as_deref(), Some("Oct 2025"));

        table.click_header(SortColumn::ListRate);
        let spec = table.click_header(SortColumn::ListRate);
        assert_eq!(spec.direction, SortDirection::Descending);

        let view = table.view(Language::Sv).unwrap();
        let names: Vec<_> = view.rows.iter().map(|r| r.bank_name.as_str()).collect();
        assert_eq!(names, ["Z", "Y"]);
        assert_eq!(view.no_data.len(), 1);
        assert_eq!(view.average_month.as_deref(), Some("okt. 2025"));
    }

    struct FixedRates;

    #[async_trait::async_trait]
    impl RatesApi for FixedRates {
        fn service_name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_comparison(&self, term: MortgageTerm) -> anyhow::Result<ComparisonResponse> {
            Ok(response(vec![row(term.short_code(), Some(3.0))]))
        }

        async fn submit_assessment(
            &self,
            _request: &AssessmentRequest,
        ) -> anyhow::Result<AssessmentResponse> {
            anyhow::bail!("not used")
        }
    }

    #[tokio::test]
    async fn load_replaces_rows_wholesale() {
        let mut table = ComparisonTable::new(MortgageTerm::Variable3M);
        assert!(table.load(&FixedRates, MortgageTerm::Fixed7Y).await);
        assert_eq!(table.data().unwrap().rows[0].bank_name, "7y");
        assert!(table.load(&FixedRates, MortgageTerm::Fixed10Y).await);
        let rows = &table.data().unwrap().rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bank_name, "10y");
    }
}
