use skybook_core::{Locale, Location};

use crate::backend::{BackendError, FlightOffer, FlightSearchRequest};

pub fn empty_message(locale: Locale) -> String {
    match locale {
        Locale::En => "Tell me where you want to fly, e.g. \"from SGN to HAN on 2025-12-01\".",
        _ => "Bạn muốn bay đi đâu? Ví dụ: \"từ SGN đến HAN ngày 2025-12-01\".",
    }
    .to_string()
}

pub fn ask_for_date(locale: Locale, origin: Option<&Location>, destination: Option<&Location>) -> String {
    let name = |location: Option<&Location>| {
        location
            .map(|l| format!("{} ({})", l.city, l.code))
            .unwrap_or_else(|| "?".to_string())
    };

    match locale {
        Locale::En => format!(
            "Flying {} → {}. Which date do you want to depart?",
            name(origin),
            name(destination)
        ),
        _ => format!(
            "Chuyến bay {} → {}. Bạn muốn khởi hành ngày nào?",
            name(origin),
            name(destination)
        ),
    }
}

pub fn format_offers(locale: Locale, request: &FlightSearchRequest, offers: &[FlightOffer]) -> String {
    let date = request.departure_date.format("%d/%m/%Y");
    if offers.is_empty() {
        return match locale {
            Locale::En => format!(
                "No flights found from {} to {} on {}.",
                request.origin_code, request.destination_code, date
            ),
            _ => format!(
                "Không tìm thấy chuyến bay nào từ {} đến {} ngày {}.",
                request.origin_code, request.destination_code, date
            ),
        };
    }

    let header = match locale {
        Locale::En => format!(
            "Found {} flight(s) {} → {} on {}:",
            offers.len(),
            request.origin_code,
            request.destination_code,
            date
        ),
        _ => format!(
            "Tìm thấy {} chuyến bay {} → {} ngày {}:",
            offers.len(),
            request.origin_code,
            request.destination_code,
            date
        ),
    };

    let lines = offers.iter().map(|offer| {
        let airline = offer
            .airline
            .as_deref()
            .map(|name| format!(" {name}"))
            .unwrap_or_default();
        format!(
            "- {}{} {} · {} {}",
            offer.flight_number,
            airline,
            offer.departure_time.format("%H:%M"),
            group_thousands(offer.price_amount),
            offer.price_currency
        )
    });

    std::iter::once(header)
        .chain(lines)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn help(locale: Locale, usage: &[String]) -> String {
    let header = match locale {
        Locale::En => "Available commands:",
        _ => "Các lệnh hỗ trợ:",
    };
    std::iter::once(header.to_string())
        .chain(usage.iter().map(|line| format!("- {line}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shown instead of the answer when a collaborator call fails.
pub fn backend_failure(locale: Locale, error: &BackendError) -> String {
    let pick = |en: &str, vi: &str| {
        if locale == Locale::En {
            en.to_string()
        } else {
            vi.to_string()
        }
    };

    match error {
        BackendError::Status { status: 401, .. } => pick(
            "Your session has expired. Please sign in again.",
            "Phiên đăng nhập đã hết hạn. Vui lòng đăng nhập lại.",
        ),
        BackendError::Status { status: 403, .. } => pick(
            "You don't have permission to do that.",
            "Bạn không có quyền thực hiện thao tác này.",
        ),
        BackendError::Status { status: 404, .. } => pick(
            "Nothing was found for that request.",
            "Không tìm thấy dữ liệu phù hợp.",
        ),
        BackendError::Status { status, .. } if *status >= 500 => pick(
            &format!("The booking system is having trouble (error {status}). Please try again later."),
            &format!("Hệ thống đặt vé đang gặp sự cố (lỗi {status}). Vui lòng thử lại sau."),
        ),
        BackendError::Status { status, .. } => pick(
            &format!("The request was rejected (error {status})."),
            &format!("Yêu cầu không hợp lệ (lỗi {status})."),
        ),
        BackendError::Timeout => pick(
            "The booking system took too long to answer. Please try again.",
            "Hệ thống phản hồi quá lâu. Vui lòng thử lại.",
        ),
        BackendError::Transport(_) => pick(
            "Cannot reach the booking system. Check your connection.",
            "Không thể kết nối tới hệ thống. Vui lòng kiểm tra kết nối mạng.",
        ),
        BackendError::Malformed(_) => pick(
            "The booking system sent an unexpected answer.",
            "Hệ thống trả về dữ liệu không hợp lệ.",
        ),
    }
}

fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
