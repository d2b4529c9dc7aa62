use std::fmt::Write;

use landdeal_common::currency::{format_amount, Currency};
use landdeal_common::form::SplitForm;

/// Per-party table of a split form with its running totals.
pub fn split_table(form: &SplitForm, currency: &Currency) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:<9} {:<28} {:>9} {:>18}",
        "#", "type", "party", "percent", "amount"
    );
    for (index, party) in form.parties().iter().enumerate() {
        let percentage = party
            .percentage
            .map(|p| format!("{p}%"))
            .unwrap_or_else(|| "-".to_string());
        let amount = party
            .amount
            .map(|a| format_amount(a, currency))
            .unwrap_or_else(|| "-".to_string());
        let marker = if party.manual_amount { " (manual)" } else { "" };
        let _ = writeln!(
            out,
            "{:<4} {:<9} {:<28} {:>9} {:>18}{marker}",
            index + 1,
            party.party_type.to_string(),
            party.display_name(),
            percentage,
            amount,
        );
    }
    let total = form
        .total()
        .map(|t| format_amount(t, currency))
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
        out,
        "total {}%  parties {}  payment {}",
        form.percentage_total(),
        format_amount(form.amount_total(), currency),
        total,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use landdeal_common::party::{PartyId, PartyShare, PartyType};
    use landdeal_common::split::SplitConfig;
    use rust_decimal_macros::dec;

    #[test]
    fn test_table_lists_every_party() {
        let form = SplitForm::with_parties(
            SplitConfig::default(),
            Some(dec!(150000)),
            vec![
                PartyShare::listed(PartyType::Owner, PartyId(1), "Asha").with_percentage(dec!(60)),
                PartyShare::other("Broker").with_manual_amount(dec!(60000)),
            ],
        );
        let table = split_table(&form, &Currency::Inr);
        // the 40% left unassigned cycles to Asha's row
        let asha = table.lines().find(|l| l.contains("Asha")).unwrap();
        assert!(asha.contains("60%"));
        assert!(asha.ends_with("₹1,50,000.00"));
        let broker = table.lines().find(|l| l.contains("Broker")).unwrap();
        assert!(broker.contains("₹60,000.00 (manual)"));
        assert!(table.ends_with("total 60%  parties ₹2,10,000.00  payment ₹1,50,000.00\n"));
    }
}
