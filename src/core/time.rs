use time::{Date, OffsetDateTime};

pub(crate) fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Serde adapter for calendar dates written as `YYYY-MM-DD`.
pub(crate) mod iso_date {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::FormatItem;
    use time::macros::format_description;
    use time::Date;

    const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub(crate) fn serialize<S: Serializer>(value: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = value.format(FORMAT).map_err(S::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub(crate) fn parse(raw: &str) -> Result<Date, String> {
        Date::parse(raw.trim(), FORMAT)
            .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD"))
    }
}
