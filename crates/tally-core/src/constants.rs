//! Program constants. All monetary values in cents (1 unit = 100 cents).

/// Cents per whole currency unit.
pub const CENTS_PER_UNIT: u64 = 100;

/// Default minimum balance required to submit a withdrawal request (500 units).
pub const DEFAULT_WITHDRAW_LIMIT: u64 = 500 * CENTS_PER_UNIT;

/// Default amount credited to both sides of a successful referral (1.00).
pub const DEFAULT_REFERRAL_REWARD: u64 = CENTS_PER_UNIT;

/// Default number of attempts for a ledger write before the error surfaces.
pub const DEFAULT_PERSIST_ATTEMPTS: u32 = 3;

/// Default timeout for oracle and transport calls, in seconds.
pub const DEFAULT_EXTERNAL_TIMEOUT_SECS: u64 = 10;

/// Default channel users must join before using the program.
pub const DEFAULT_CHANNEL: &str = "@ForexNews24hours";

/// Default bot username used to build invite links.
pub const DEFAULT_BOT_USERNAME: &str = "get500dollar_bot";

/// Maximum number of balance history entries shown on the history screen.
pub const HISTORY_SCREEN_ENTRIES: usize = 10;

/// Withdrawal channel offered to users: `(label, prompt for the payout details)`.
pub type PaymentMethod = (&'static str, &'static str);

/// Fixed catalog of withdrawal channels. Users pick by index.
pub const PAYMENT_METHODS: &[PaymentMethod] = &[
    ("PayPal (worldwide)", "Send the email of your PayPal account"),
    ("Visa/MasterCard (worldwide)", "Send the card number, holder name and expiry date"),
    ("USDT (TRC20)", "Send your USDT (TRC20) wallet address"),
    ("Bitcoin", "Send your Bitcoin wallet address"),
    ("Payeer", "Send your Payeer account number"),
    ("Perfect Money", "Send your Perfect Money account number"),
    ("Neteller", "Send your Neteller email"),
    ("Western Union (worldwide)", "Send your full name and transfer number"),
    ("Payoneer", "Send the email of your Payoneer account"),
    ("Syriatel Cash (Syria)", "Send your Syriatel Cash number"),
    ("MTN Cash (Syria)", "Send your MTN Cash number"),
    ("Sham Cash (Syria)", "Send your Sham Cash number or account name"),
    ("Bemo Saudi Fransi (Syria)", "Send your Bemo account number or full name"),
    ("Al Baraka Bank (Syria)", "Send your Al Baraka customer number"),
    ("Vodafone Cash (Egypt)", "Send your Vodafone Cash number"),
    ("Orange Cash (Egypt)", "Send your Orange Cash number"),
    ("Etisalat Cash (Egypt)", "Send your Etisalat Cash number"),
    ("Banque Misr (Egypt)", "Send your Banque Misr account number"),
    ("Dinarak (Jordan)", "Send your Dinarak account number"),
    ("Housing Bank (Jordan)", "Send your Housing Bank account number"),
    ("Zain Cash (Iraq)", "Send your Zain Cash number"),
    ("MoneyGram (Iraq)", "Send the recipient name and transfer number"),
    ("Wafacash (Morocco)", "Send your Wafacash number"),
    ("CIH Bank (Morocco)", "Send your CIH Bank account number"),
    ("Algerie Poste (Algeria)", "Send your Algerie Poste account number"),
    ("ABC Bank Algeria", "Send your ABC Bank Algeria account number"),
    ("Al Rajhi Bank (Saudi Arabia)", "Send your Al Rajhi account number"),
    ("Saudi National Bank", "Send your SNB account number"),
    ("Jawwal Pay (Palestine)", "Send your Jawwal Pay wallet number"),
    ("Bank of Palestine", "Send your Bank of Palestine account number"),
    ("Mobile Money (Libya)", "Send your Mobile Money number"),
    ("CashU (Arab countries)", "Send the email of your CashU account"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_is_five_hundred_units() {
        assert_eq!(DEFAULT_WITHDRAW_LIMIT / CENTS_PER_UNIT, 500);
    }

    #[test]
    fn payment_catalog_labels_are_unique() {
        let mut labels: Vec<_> = PAYMENT_METHODS.iter().map(|(label, _)| *label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), PAYMENT_METHODS.len());
    }
}
