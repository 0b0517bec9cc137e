/// Title stems that mark a chat as freight-related in the discovery snapshot.
/// Only annotates discovery output; never gates ingestion.
///
/// Russian stems only; the monitored chats are Russian-language freight boards.
pub const CARGO_TITLE_KEYWORDS: &[&str] = &[
    "груз",      // груз, грузы, грузоперевозки …
    "перевозка", // перевозка, перевозки
    "доставка",
    "транспорт",
    "логистика",
    "фура", // фура, фуры
    "тонн", // тонна, тонн
];
