use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::domain::{AggregateResult, MonthKey, MonthlySales, Ranked, Record};

/// Reduce a record set to its KPIs and chart-ready groupings.
///
/// Amounts are summed as decimals, so the result does not depend on record
/// order. An empty input yields zero KPIs and empty groupings.
pub fn summarize<'a, I>(records: I) -> AggregateResult
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut order_count = 0usize;
    let mut total_sales = Decimal::ZERO;
    let mut total_profit = Decimal::ZERO;

    let mut sales_by_category = GroupSum::default();
    let mut profit_by_category = GroupSum::default();
    let mut sales_by_region = GroupSum::default();
    let mut profit_by_region = GroupSum::default();
    let mut monthly: BTreeMap<MonthKey, Decimal> = BTreeMap::new();

    for r in records {
        order_count += 1;
        total_sales += r.sales;
        total_profit += r.profit;

        sales_by_category.add(&r.category, r.sales);
        profit_by_category.add(&r.category, r.profit);
        sales_by_region.add(&r.region, r.sales);
        profit_by_region.add(&r.region, r.profit);

        *monthly.entry(MonthKey::from_date(r.order_date)).or_default() += r.sales;
    }

    let average_order_value = average(total_sales, order_count);

    tracing::debug!(order_count, %total_sales, %total_profit, "summarized records");

    AggregateResult {
        order_count,
        total_sales,
        total_profit,
        average_order_value,
        sales_by_category: sales_by_category.ranked(),
        profit_by_category: profit_by_category.ranked(),
        sales_by_region: sales_by_region.ranked(),
        profit_by_region: profit_by_region.ranked(),
        monthly_sales_series: monthly
            .into_iter()
            .map(|(month, sales)| MonthlySales { month, sales })
            .collect(),
    }
}

/// `total / count`, or zero for an empty set.
pub fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(count)).normalize()
}

/// Per-key sums that remember first-seen key order.
#[derive(Debug, Default)]
struct GroupSum {
    index: HashMap<String, usize>,
    groups: Vec<Ranked>,
}

impl GroupSum {
    fn add(&mut self, key: &str, value: Decimal) {
        match self.index.get(key) {
            Some(&i) => self.groups[i].value += value,
            None => {
                self.index.insert(key.to_string(), self.groups.len());
                self.groups.push(Ranked {
                    key: key.to_string(),
                    value,
                });
            }
        }
    }

    /// Groups by value descending. `sort_by` is stable, so ties stay in
    /// first-seen order.
    fn ranked(mut self) -> Vec<Ranked> {
        self.groups.sort_by(|a, b| b.value.cmp(&a.value));
        self.groups
    }
}
