//! The fixed article catalog.
//!
//! Articles are defined once at compile time and never mutated. Bodies are
//! raw markdown kept under `content/articles/` and embedded into the binary.

use std::fmt;

pub const AUTHOR: &str = "Yaşar Efe Çelik";
pub const PUBLISHED: &str = "22.11.2025";

/// Text for the "about" view.
pub const ABOUT: &str = "Merhaba! Tarih ve teknoloji arasındaki köprüde yürümeyi seven bir öğrenciyim. \
Bu blog, \"Tarih sadece geçmişte kalan bir şey midir, yoksa onu bugünün teknolojisiyle yeniden mi yazıyoruz?\" \
sorusuna cevap aramak için kuruldu. Dijitalleşmenin tarih disiplinini nasıl dönüştürdüğünü, lise düzeyinde bir \
araştırmacı gözüyle inceliyorum.";

/// How an article judges the effect of digitalisation on its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Mixed => "mixed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: &'static str,
    pub title: &'static str,
    pub summary: &'static str,
    pub body_markdown: &'static str,
    pub author: &'static str,
    pub date: &'static str,
    pub image_url: &'static str,
    /// Hashtag-style labels, in display order.
    pub tags: &'static [&'static str],
    pub read_time_minutes: u32,
    pub impact: Impact,
}

impl Article {
    /// First tag without its leading `#`, used as the card label.
    #[must_use]
    pub fn primary_tag(&self) -> Option<&'static str> {
        self.tags.first().map(|tag| tag.trim_start_matches('#'))
    }
}

static CATALOG: [Article; 8] = [
    Article {
        id: "1",
        title: "Dijital Arşivlerin Yükselişi: Erişilebilirlik Devrimi",
        summary: "Fiziksel arşivlerin dijitalleşmesi, araştırmacıların kaynaklara erişim hızını artırırken coğrafi sınırları ortadan kaldırıyor. Artık tozlu raflar değil, bulut sunucular tarihin hafızasını taşıyor.",
        body_markdown: include_str!("../content/articles/1.md"),
        author: AUTHOR,
        date: PUBLISHED,
        image_url: "https://cdn.pixabay.com/photo/2019/01/25/19/02/book-3955129_1280.jpg",
        tags: &["#Arşiv", "#Teknoloji", "#VeriAnalizi"],
        read_time_minutes: 8,
        impact: Impact::Positive,
    },
    Article {
        id: "2",
        title: "Bilgi Kirliliği ve Dijital Tarih Yazımı",
        summary: "İnternet, bilgiye erişimi kolaylaştırırken yanlış bilginin yayılmasını da hızlandırdı. \"Post-Truth\" (Hakikat Ötesi) çağında tarihçi, gerçeğin bekçisi olmak zorunda.",
        body_markdown: include_str!("../content/articles/2.md"),
        author: AUTHOR,
        date: PUBLISHED,
        image_url: "https://images.unsplash.com/photo-1504711434969-e33886168f5c?ixlib=rb-4.0.3&auto=format&fit=crop&w=1600&q=80",
        tags: &["#Dezenformasyon", "#Medya", "#EleştirelDüşünce"],
        read_time_minutes: 10,
        impact: Impact::Negative,
    },
    Article {
        id: "3",
        title: "Dijital Karanlık Çağ: Geleceğin Tarihi Siliniyor mu?",
        summary: "Bugün ürettiğimiz dijital veriler 100 yıl sonra okunabilecek mi? Dosya formatlarının eskimesi ve \"Bit Rot\" tehdidi, geleceğin tarihçilerini kaynaksız bırakabilir.",
        body_markdown: include_str!("../content/articles/3.md"),
        author: AUTHOR,
        date: PUBLISHED,
        image_url: "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?ixlib=rb-4.0.3&auto=format&fit=crop&w=1600&q=80",
        tags: &["#VeriKaybı", "#Gelecek", "#Teknoloji"],
        read_time_minutes: 7,
        impact: Impact::Negative,
    },
    Article {
        id: "4",
        title: "Mekansal Tarih: Coğrafi Bilgi Sistemleri (GIS)",
        summary: "Tarihi sadece zaman çizgisi üzerinden değil, haritalar üzerinden okumak. GIS teknolojisi, tarihsel verileri görselleştirerek yeni bağlantıları ortaya çıkarıyor.",
        body_markdown: include_str!("../content/articles/4.md"),
        author: AUTHOR,
        date: PUBLISHED,
        image_url: "https://images.unsplash.com/photo-1524661135-423995f22d0b?ixlib=rb-4.0.3&auto=format&fit=crop&w=1600&q=80",
        tags: &["#GIS", "#Harita", "#MekansalAnaliz"],
        read_time_minutes: 9,
        impact: Impact::Positive,
    },
    Article {
        id: "5",
        title: "Yapay Zeka ve Tarihçilik: Dost mu Düşman mı?",
        summary: "Yapay zeka algoritmaları, hasarlı metinleri tamamlamaktan eski dilleri çevirmeye kadar tarihçilere süper güçler kazandırıyor. Ancak etik sınırlar nerede başlıyor?",
        body_markdown: include_str!("../content/articles/5.md"),
        author: AUTHOR,
        date: PUBLISHED,
        image_url: "https://images.unsplash.com/photo-1620712943543-bcc4688e7485?ixlib=rb-4.0.3&auto=format&fit=crop&w=1600&q=80",
        tags: &["#YapayZeka", "#AI", "#Gelecek"],
        read_time_minutes: 6,
        impact: Impact::Mixed,
    },
    Article {
        id: "6",
        title: "Video Oyunları ile Tarih Öğretimi",
        summary: "Assassin's Creed veya Civilization gibi oyunlar, genç nesillerin tarihle ilk temas noktası oluyor. Simülasyonlar, sınıf içi eğitimden daha etkili olabilir mi?",
        body_markdown: include_str!("../content/articles/6.md"),
        author: AUTHOR,
        date: PUBLISHED,
        image_url: "https://images.unsplash.com/photo-1552820728-8b83bb6b773f?ixlib=rb-4.0.3&auto=format&fit=crop&w=1600&q=80",
        tags: &["#Oyunlaştırma", "#Eğitim", "#Simülasyon"],
        read_time_minutes: 7,
        impact: Impact::Positive,
    },
    Article {
        id: "7",
        title: "Sanal Müzecilik ve Ziyaretçi Deneyimi",
        summary: "Müzeler artık duvarların ötesine taşıyor. Sanal Gerçeklik (VR) ve Artırılmış Gerçeklik (AR) ile evinizin salonundan Göbeklitepe'yi gezmek mümkün.",
        body_markdown: include_str!("../content/articles/7.md"),
        author: AUTHOR,
        date: PUBLISHED,
        image_url: "https://images.unsplash.com/photo-1592496001020-d31bd830651f?ixlib=rb-4.0.3&auto=format&fit=crop&w=1600&q=80",
        tags: &["#SanalMüze", "#VR", "#Eğitim"],
        read_time_minutes: 5,
        impact: Impact::Positive,
    },
    Article {
        id: "8",
        title: "Blokzincir ve Tarih: Değiştirilemez Arşivler",
        summary: "Tarihi belgelerin manipüle edilmesini önlemek için kripto teknolojileri kullanılabilir mi? Blokzincir (Blockchain), dijital tarihin noterliğini yapmaya aday.",
        body_markdown: include_str!("../content/articles/8.md"),
        author: AUTHOR,
        date: PUBLISHED,
        image_url: "https://images.unsplash.com/photo-1639322537228-f710d846310a?ixlib=rb-4.0.3&auto=format&fit=crop&w=1600&q=80",
        tags: &["#Blokzincir", "#Güvenlik", "#Teknoloji"],
        read_time_minutes: 8,
        impact: Impact::Positive,
    },
];

/// Every article, in publication order.
#[must_use]
pub fn catalog() -> &'static [Article] {
    &CATALOG
}

#[must_use]
pub fn find(id: &str) -> Option<&'static Article> {
    CATALOG.iter().find(|article| article.id == id)
}

#[cfg(test)]
#[path = "articles_test.rs"]
mod tests;
