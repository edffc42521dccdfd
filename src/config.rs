// Environment-driven configuration: server binding, database, hotel identity,
// bank transfer details, notification provider credentials, admin login.

use std::env;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub hotel: HotelInfo,
    pub bank: BankDetails,
    pub email: EmailConfig,
    pub sms: SmsConfig,
    pub admin: AdminConfig,
}

// Static hotel identity rendered into every outbound message.
#[derive(Debug, Clone)]
pub struct HotelInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub check_in_time: String,
    pub check_out_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub upi_id: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub sender_name: String,
    pub sender_email: String,
    pub brevo_api_key: Option<String>,
    pub brevo_api_base: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsProviderKind {
    Brevo,
    Msg91,
    Disabled,
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub provider: SmsProviderKind,
    pub sender: String,
    pub brevo_api_key: Option<String>,
    pub brevo_api_base: String,
    pub msg91_auth_key: Option<String>,
    pub msg91_api_base: String,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    pub session_ttl_hours: i64,
}

const DEFAULT_BREVO_API_BASE: &str = "https://api.brevo.com/v3";
const DEFAULT_MSG91_API_BASE: &str = "https://api.msg91.com";

impl AppConfig {
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");
        let port = env_or("PORT", "3000");
        let brevo_api_key = env::var("BREVO_API_KEY").ok().filter(|v| !v.is_empty());

        AppConfig {
            bind_addr: format!("{host}:{port}"),
            database_url: env_or("DATABASE_URL", "sqlite://hotel.db"),
            hotel: HotelInfo {
                name: env_or("HOTEL_NAME", "Hotel Navjeevan Palace"),
                phone: env_or("HOTEL_PHONE", "0294-2482909 / 7230082909"),
                email: env_or("CONTACT_EMAIL", "navjeevanudaipur@gmail.com"),
                address: env_or(
                    "HOTEL_ADDRESS",
                    "1, Shivaji Nagar, City Station Road, Udaipur-313001 (Rajasthan)",
                ),
                check_in_time: env_or("CHECK_IN_TIME", "12:00 PM (Noon)"),
                check_out_time: env_or("CHECK_OUT_TIME", "10:00 AM"),
            },
            bank: BankDetails {
                bank_name: env_or("BANK_NAME", "State Bank of India"),
                account_name: env_or("BANK_ACCOUNT_NAME", "Hotel Navjeevan Palace"),
                account_number: env_or("BANK_ACCOUNT_NUMBER", "1234567890123456"),
                ifsc_code: env_or("BANK_IFSC", "SBIN0001234"),
                upi_id: env_or("BANK_UPI_ID", "navjeevanpalace@paytm"),
            },
            email: EmailConfig {
                sender_name: env_or("BREVO_SENDER_NAME", "Hotel Navjeevan Palace"),
                sender_email: env_or("BREVO_SENDER_EMAIL", "noreply@hotelnavjeevanpalace.com"),
                brevo_api_key: brevo_api_key.clone(),
                brevo_api_base: env_or("BREVO_API_BASE", DEFAULT_BREVO_API_BASE),
            },
            sms: SmsConfig {
                provider: parse_sms_provider(&env_or("SMS_PROVIDER", "brevo")),
                sender: env_or("SMS_SENDER", "NAVJEE"),
                brevo_api_key,
                brevo_api_base: env_or("BREVO_API_BASE", DEFAULT_BREVO_API_BASE),
                msg91_auth_key: env::var("MSG91_AUTH_KEY").ok().filter(|v| !v.is_empty()),
                msg91_api_base: env_or("MSG91_API_BASE", DEFAULT_MSG91_API_BASE),
            },
            admin: AdminConfig {
                email: env_or("ADMIN_EMAIL", "admin@hotelnavjeevanpalace.com"),
                password: env_or("ADMIN_PASSWORD", "change-me"),
                session_ttl_hours: env_or("SESSION_TTL_HOURS", "24").parse().unwrap_or(24),
            },
        }
    }
}

fn parse_sms_provider(value: &str) -> SmsProviderKind {
    match value.to_ascii_lowercase().as_str() {
        "brevo" => SmsProviderKind::Brevo,
        "msg91" => SmsProviderKind::Msg91,
        "disabled" | "none" | "" => SmsProviderKind::Disabled,
        other => {
            tracing::warn!(provider = other, "unknown SMS provider, disabling SMS channel");
            SmsProviderKind::Disabled
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
