// UI strings. The language is an explicit value handed to whoever renders
// text; nothing here is global.
use crate::model::FieldKey;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Cs,
    En,
}

impl Lang {
    pub fn toggled(self) -> Self {
        match self {
            Lang::Cs => Lang::En,
            Lang::En => Lang::Cs,
        }
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cs" => Ok(Lang::Cs),
            "en" => Ok(Lang::En),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    NoOffers,
    NoOffersTip,
    SortGraphScore,
    SoldSection,
    Unknown,
    Score,
    SyncConnected,
    SyncDisconnect,
    SyncShareHint,
    OffersToImport,
    ReplaceAll,
    AddToExisting,
    InvalidFile,
    Exported,
    Added,
    RangesFitted,
    RangesUnchanged,
}

/// Looks up UI strings for one language.
#[derive(Debug, Clone, Copy)]
pub struct Translator {
    lang: Lang,
}

impl Translator {
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn t(&self, msg: Msg) -> &'static str {
        match self.lang {
            Lang::Cs => cs(msg),
            Lang::En => en(msg),
        }
    }

    pub fn field_label(&self, key: &FieldKey) -> String {
        let label = match (self.lang, key) {
            (Lang::Cs, FieldKey::Price) => "Cena",
            (Lang::Cs, FieldKey::Size) => "Plocha",
            (Lang::Cs, FieldKey::Rooms) => "Dispozice",
            (Lang::Cs, FieldKey::Floor) => "Patro",
            (Lang::Cs, FieldKey::Address) => "Adresa",
            (Lang::Cs, FieldKey::Location) => "Lokalita",
            (Lang::Cs, FieldKey::Balcony) => "Balkón/Lodžie",
            (Lang::Cs, FieldKey::Cellar) => "Sklep",
            (Lang::Cs, FieldKey::Parking) => "Parkování",
            (Lang::Cs, FieldKey::Building) => "Budova",
            (Lang::Cs, FieldKey::Energy) => "Energie",
            (Lang::En, FieldKey::Price) => "Price",
            (Lang::En, FieldKey::Size) => "Interior area",
            (Lang::En, FieldKey::Rooms) => "Rooms",
            (Lang::En, FieldKey::Floor) => "Floor",
            (Lang::En, FieldKey::Address) => "Address",
            (Lang::En, FieldKey::Location) => "Location",
            (Lang::En, FieldKey::Balcony) => "Balcony/Loggia",
            (Lang::En, FieldKey::Cellar) => "Cellar",
            (Lang::En, FieldKey::Parking) => "Parking",
            (Lang::En, FieldKey::Building) => "Building",
            (Lang::En, FieldKey::Energy) => "Energy",
            (_, other) => return other.as_str().to_string(),
        };
        label.to_string()
    }
}

fn cs(msg: Msg) -> &'static str {
    match msg {
        Msg::NoOffers => "Žádné nabídky",
        Msg::NoOffersTip => "Přidejte nabídku příkazem `add`",
        Msg::SortGraphScore => "Skóre",
        Msg::SoldSection => "Prodané",
        Msg::Unknown => "Neznámé",
        Msg::Score => "Skóre",
        Msg::SyncConnected => "Připojeno",
        Msg::SyncDisconnect => "Odpojeno",
        Msg::SyncShareHint => "Sdílejte kód místnosti. Ostatní uvidí živé úpravy.",
        Msg::OffersToImport => "nabídky připraveny k importu.",
        Msg::ReplaceAll => "Nahradit vše",
        Msg::AddToExisting => "Přidat ke stávajícím",
        Msg::InvalidFile => "Neplatný soubor",
        Msg::Exported => "Exportováno",
        Msg::Added => "Přidáno",
        Msg::RangesFitted => "Rozsahy upraveny podle vybraných nabídek",
        Msg::RangesUnchanged => "Málo dat pro úpravu rozsahů",
    }
}

fn en(msg: Msg) -> &'static str {
    match msg {
        Msg::NoOffers => "No offers yet",
        Msg::NoOffersTip => "Use `add` to start",
        Msg::SortGraphScore => "Graph score",
        Msg::SoldSection => "Sold",
        Msg::Unknown => "Unknown",
        Msg::Score => "Score",
        Msg::SyncConnected => "Connected",
        Msg::SyncDisconnect => "Disconnected",
        Msg::SyncShareHint => "Share the room code. Anyone with it sees live updates.",
        Msg::OffersToImport => "offers ready to import.",
        Msg::ReplaceAll => "Replace all",
        Msg::AddToExisting => "Add to existing",
        Msg::InvalidFile => "Invalid file",
        Msg::Exported => "Exported",
        Msg::Added => "Added",
        Msg::RangesFitted => "Ranges fitted to starred offers",
        Msg::RangesUnchanged => "Not enough data to fit ranges",
    }
}
