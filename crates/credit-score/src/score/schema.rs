//! The fixed 20-field schema one prediction request is assembled from.

use serde::{Deserialize, Serialize};

/// Occupations the preprocessor was fitted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupation {
    Scientist,
    Mechanic,
    Architect,
    Engineer,
}

impl Occupation {
    pub fn as_str(self) -> &'static str {
        match self {
            Occupation::Scientist => "Scientist",
            Occupation::Mechanic => "Mechanic",
            Occupation::Architect => "Architect",
            Occupation::Engineer => "Engineer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditMix {
    Good,
    Standard,
    Bad,
}

impl CreditMix {
    pub fn as_str(self) -> &'static str {
        match self {
            CreditMix::Good => "Good",
            CreditMix::Standard => "Standard",
            CreditMix::Bad => "Bad",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOfMinAmount {
    No,
    Yes,
}

impl PaymentOfMinAmount {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentOfMinAmount::No => "No",
            PaymentOfMinAmount::Yes => "Yes",
        }
    }
}

/// Spending/payment pattern labels exactly as they appear in the training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentBehaviour {
    #[serde(rename = "High_spent_Small_value_payments")]
    HighSpentSmallValue,
    #[serde(rename = "Low_spent_Small_value_payments")]
    LowSpentSmallValue,
    #[serde(rename = "High_spent_Medium_value_payments")]
    HighSpentMediumValue,
}

impl PaymentBehaviour {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentBehaviour::HighSpentSmallValue => "High_spent_Small_value_payments",
            PaymentBehaviour::LowSpentSmallValue => "Low_spent_Small_value_payments",
            PaymentBehaviour::HighSpentMediumValue => "High_spent_Medium_value_payments",
        }
    }
}

/// One form submission as collected: 15 numeric attributes, 4 categoricals,
/// and the credit history age still as free text. Numeric ranges and the
/// categorical domains are enforced at the input boundary (form constraints
/// and the closed enums above), not re-validated here.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerProfile {
    pub annual_income: f64,
    pub monthly_inhand_salary: f64,
    pub num_bank_accounts: u32,
    pub num_credit_card: u32,
    pub interest_rate: f64,
    pub num_of_loan: u32,
    pub delay_from_due_date: u32,
    pub num_of_delayed_payment: u32,
    pub changed_credit_limit: f64,
    pub num_credit_inquiries: u32,
    pub outstanding_debt: f64,
    pub credit_utilization_ratio: f64,
    pub total_emi_per_month: f64,
    pub amount_invested_monthly: f64,
    pub monthly_balance: f64,
    pub credit_history_age: String,
    pub occupation: Occupation,
    pub credit_mix: CreditMix,
    pub payment_of_min_amount: PaymentOfMinAmount,
    pub payment_behaviour: PaymentBehaviour,
}

/// The complete, well-typed record handed to the inference gateway. Built
/// once per submission, immutable, discarded after the response is rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub annual_income: f64,
    pub monthly_inhand_salary: f64,
    pub num_bank_accounts: u32,
    pub num_credit_card: u32,
    pub interest_rate: f64,
    pub num_of_loan: u32,
    pub delay_from_due_date: u32,
    pub num_of_delayed_payment: u32,
    pub changed_credit_limit: f64,
    pub num_credit_inquiries: u32,
    pub outstanding_debt: f64,
    pub credit_utilization_ratio: f64,
    pub total_emi_per_month: f64,
    pub amount_invested_monthly: f64,
    pub monthly_balance: f64,
    pub credit_history_age_months: u32,
    pub occupation: Occupation,
    pub credit_mix: CreditMix,
    pub payment_of_min_amount: PaymentOfMinAmount,
    pub payment_behaviour: PaymentBehaviour,
}

impl FeatureRecord {
    /// Pure structural mapping from a submission plus the derived month
    /// count. Callers must have parsed the duration field first; nothing
    /// incomplete can reach the gateway.
    pub fn assemble(profile: CustomerProfile, credit_history_age_months: u32) -> Self {
        Self {
            annual_income: profile.annual_income,
            monthly_inhand_salary: profile.monthly_inhand_salary,
            num_bank_accounts: profile.num_bank_accounts,
            num_credit_card: profile.num_credit_card,
            interest_rate: profile.interest_rate,
            num_of_loan: profile.num_of_loan,
            delay_from_due_date: profile.delay_from_due_date,
            num_of_delayed_payment: profile.num_of_delayed_payment,
            changed_credit_limit: profile.changed_credit_limit,
            num_credit_inquiries: profile.num_credit_inquiries,
            outstanding_debt: profile.outstanding_debt,
            credit_utilization_ratio: profile.credit_utilization_ratio,
            total_emi_per_month: profile.total_emi_per_month,
            amount_invested_monthly: profile.amount_invested_monthly,
            monthly_balance: profile.monthly_balance,
            credit_history_age_months,
            occupation: profile.occupation,
            credit_mix: profile.credit_mix,
            payment_of_min_amount: profile.payment_of_min_amount,
            payment_behaviour: profile.payment_behaviour,
        }
    }

    /// Look up a numeric attribute by its training-time column name. The
    /// fitted preprocessor owns the column ordering, so transforms pull
    /// values by name rather than relying on struct field order.
    pub fn numeric_value(&self, column: &str) -> Option<f64> {
        match column {
            "Annual_Income" => Some(self.annual_income),
            "Monthly_Inhand_Salary" => Some(self.monthly_inhand_salary),
            "Num_Bank_Accounts" => Some(f64::from(self.num_bank_accounts)),
            "Num_Credit_Card" => Some(f64::from(self.num_credit_card)),
            "Interest_Rate" => Some(self.interest_rate),
            "Num_of_Loan" => Some(f64::from(self.num_of_loan)),
            "Delay_from_due_date" => Some(f64::from(self.delay_from_due_date)),
            "Num_of_Delayed_Payment" => Some(f64::from(self.num_of_delayed_payment)),
            "Changed_Credit_Limit" => Some(self.changed_credit_limit),
            "Num_Credit_Inquiries" => Some(f64::from(self.num_credit_inquiries)),
            "Outstanding_Debt" => Some(self.outstanding_debt),
            "Credit_Utilization_Ratio" => Some(self.credit_utilization_ratio),
            "Total_EMI_per_month" => Some(self.total_emi_per_month),
            "Amount_invested_monthly" => Some(self.amount_invested_monthly),
            "Monthly_Balance" => Some(self.monthly_balance),
            "Credit_History_Age_Months" => Some(f64::from(self.credit_history_age_months)),
            _ => None,
        }
    }

    /// Look up a categorical attribute by its training-time column name.
    pub fn categorical_value(&self, column: &str) -> Option<&'static str> {
        match column {
            "Occupation" => Some(self.occupation.as_str()),
            "Credit_Mix" => Some(self.credit_mix.as_str()),
            "Payment_of_Min_Amount" => Some(self.payment_of_min_amount.as_str()),
            "Payment_Behaviour" => Some(self.payment_behaviour.as_str()),
            _ => None,
        }
    }
}

/// Representative midrange submission shared across the crate's tests.
#[cfg(test)]
pub(crate) fn midrange_profile_for_tests() -> CustomerProfile {
    serde_json::from_value(serde_json::json!({
        "annual_income": 52000.0,
        "monthly_inhand_salary": 4100.0,
        "num_bank_accounts": 3,
        "num_credit_card": 4,
        "interest_rate": 11.5,
        "num_of_loan": 2,
        "delay_from_due_date": 9,
        "num_of_delayed_payment": 5,
        "changed_credit_limit": 6.2,
        "num_credit_inquiries": 4,
        "outstanding_debt": 1250.0,
        "credit_utilization_ratio": 31.4,
        "total_emi_per_month": 210.0,
        "amount_invested_monthly": 120.0,
        "monthly_balance": 380.0,
        "credit_history_age": "15 Years and 3 Months",
        "occupation": "Engineer",
        "credit_mix": "Good",
        "payment_of_min_amount": "No",
        "payment_behaviour": "Low_spent_Small_value_payments"
    }))
    .expect("midrange profile deserializes")
}
