use sqlx::sqlite::SqlitePool;

pub async fn setup(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create the CRM tables matching the built-in schema registry
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS regio (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            naam TEXT NOT NULL,
            code TEXT NOT NULL,
            beschrijving TEXT,
            actief BOOLEAN DEFAULT true,
            aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
            bijgewerkt_op DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS klanten (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            naam TEXT NOT NULL,
            email TEXT NOT NULL,
            telefoon TEXT,
            adres TEXT,
            regio_id INTEGER REFERENCES regio(id),
            status TEXT DEFAULT 'prospect',
            aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
            bijgewerkt_op DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verkopers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            naam TEXT NOT NULL,
            email TEXT NOT NULL,
            telefoon TEXT,
            regio_id INTEGER REFERENCES regio(id),
            commissie_percentage REAL,
            actief BOOLEAN DEFAULT true,
            aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
            bijgewerkt_op DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS campagnes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            naam TEXT NOT NULL,
            beschrijving TEXT,
            start_datum DATE,
            eind_datum DATE,
            status TEXT DEFAULT 'actief',
            aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
            bijgewerkt_op DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS gesprekken (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            klant_id INTEGER REFERENCES klanten(id),
            verkoper_id INTEGER REFERENCES verkopers(id),
            campagne_id INTEGER REFERENCES campagnes(id),
            regio_id INTEGER REFERENCES regio(id),
            datum DATE NOT NULL,
            notities TEXT,
            status TEXT DEFAULT 'gepland',
            aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
            bijgewerkt_op DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS belschema (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            naam TEXT NOT NULL,
            beschrijving TEXT,
            actief BOOLEAN DEFAULT true,
            aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
            bijgewerkt_op DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS call_scripts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            naam TEXT NOT NULL,
            script TEXT NOT NULL,
            actief BOOLEAN DEFAULT true,
            aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
            bijgewerkt_op DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admin_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            naam TEXT NOT NULL,
            rol TEXT NOT NULL DEFAULT 'user',
            actief BOOLEAN DEFAULT true,
            aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
            bijgewerkt_op DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    // The logs table keeps the column convention of the logging pipeline
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS logs (
            id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            status TEXT NOT NULL,
            message TEXT NOT NULL,
            data TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            user_id TEXT,
            ip TEXT,
            device TEXT,
            region TEXT,
            twilio_sid TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS instellingen (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            beschrijving TEXT,
            aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
            bijgewerkt_op DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Seed sample data if the database is empty
    seed_sample_data(pool).await?;

    Ok(())
}

async fn seed_sample_data(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let regio_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM regio")
        .fetch_one(pool)
        .await?;

    if regio_count.0 > 0 {
        // Data already seeded
        return Ok(());
    }

    let regios = [
        ("Noord", "N", "Groningen, Friesland en Drenthe"),
        ("Oost", "O", "Overijssel en Gelderland"),
        ("Zuid", "Z", "Brabant en Limburg"),
        ("West", "W", "Randstad"),
    ];
    for (naam, code, beschrijving) in regios {
        sqlx::query("INSERT INTO regio (naam, code, beschrijving, actief) VALUES (?, ?, ?, true)")
            .bind(naam)
            .bind(code)
            .bind(beschrijving)
            .execute(pool)
            .await?;
    }

    let voornamen = [
        "Jan", "Piet", "Klaas", "Marie", "Anna", "Sophie", "Daan", "Lars", "Emma", "Lotte",
        "Bram", "Sanne", "Thijs", "Femke", "Ruben", "Iris",
    ];
    let achternamen = [
        "de Vries", "Jansen", "van Dijk", "Bakker", "Visser", "Smit", "Meijer", "Mulder",
        "de Boer", "Bos", "Peters", "Hendriks", "van Leeuwen", "Dekker", "Brouwer", "de Wit",
    ];

    // Generate 40 klanten spread over the regions
    for index in 0..40 {
        let voornaam = voornamen[index % voornamen.len()];
        let achternaam = achternamen[(index * 3) % achternamen.len()];
        let naam = format!("{} {}", voornaam, achternaam);
        let email = format!(
            "{}.{}{}@example.com",
            voornaam.to_lowercase(),
            achternaam.replace(' ', "").to_lowercase(),
            index
        );
        let telefoon = format!("06-{:08}", 10000000 + index * 37);
        let regio_id = (index % regios.len()) + 1;
        let status = ["actief", "inactief", "prospect"][index % 3];

        sqlx::query(
            "INSERT INTO klanten (naam, email, telefoon, regio_id, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(naam)
        .bind(email)
        .bind(telefoon)
        .bind(regio_id as i64)
        .bind(status)
        .execute(pool)
        .await?;
    }

    // Generate 8 verkopers
    for index in 0..8 {
        let voornaam = voornamen[(index + 5) % voornamen.len()];
        let achternaam = achternamen[(index + 7) % achternamen.len()];
        sqlx::query(
            "INSERT INTO verkopers (naam, email, regio_id, commissie_percentage, actief) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(format!("{} {}", voornaam, achternaam))
        .bind(format!(
            "{}.verkoop{}@example.com",
            voornaam.to_lowercase(),
            index
        ))
        .bind(((index % regios.len()) + 1) as i64)
        .bind(5.0 + (index as f64) * 0.5)
        .bind(index % 4 != 3)
        .execute(pool)
        .await?;
    }

    let campagnes = [
        ("Voorjaarsactie", "2024-03-01", "2024-05-31", "voltooid"),
        ("Zomercampagne", "2024-06-01", "2024-08-31", "actief"),
        ("Najaarsactie", "2024-09-01", "2024-11-30", "actief"),
    ];
    for (naam, start, eind, status) in campagnes {
        sqlx::query(
            "INSERT INTO campagnes (naam, start_datum, eind_datum, status) VALUES (?, ?, ?, ?)",
        )
        .bind(naam)
        .bind(start)
        .bind(eind)
        .bind(status)
        .execute(pool)
        .await?;
    }

    // Generate 60 gesprekken
    for index in 0..60 {
        let klant_id = (index % 40) + 1;
        let verkoper_id = (index % 8) + 1;
        let campagne_id = (index % 3) + 1;
        let regio_id = (index % 4) + 1;
        let datum = format!("2024-{:02}-{:02}", (index % 9) + 1, (index % 27) + 1);
        let status = ["gepland", "voltooid", "geannuleerd"][index % 3];

        sqlx::query(
            "INSERT INTO gesprekken \
             (klant_id, verkoper_id, campagne_id, regio_id, datum, notities, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(klant_id as i64)
        .bind(verkoper_id as i64)
        .bind(campagne_id as i64)
        .bind(regio_id as i64)
        .bind(datum)
        .bind(format!("Notitie bij gesprek {}", index + 1))
        .bind(status)
        .execute(pool)
        .await?;
    }

    sqlx::query("INSERT INTO belschema (naam, beschrijving) VALUES (?, ?)")
        .bind("Wekelijkse follow-up")
        .bind("Elke maandag de openstaande prospects bellen")
        .execute(pool)
        .await?;

    sqlx::query("INSERT INTO call_scripts (naam, script) VALUES (?, ?)")
        .bind("Introductie")
        .bind("Goedemorgen, u spreekt met {verkoper} van CRM Admin. Bel ik gelegen?")
        .execute(pool)
        .await?;

    sqlx::query("INSERT INTO admin_users (email, naam, rol) VALUES (?, ?, ?)")
        .bind("admin@example.com")
        .bind("Beheerder")
        .bind("admin")
        .execute(pool)
        .await?;

    // Logs with a structured data payload
    for index in 0..20 {
        let data = format!(r#"{{"gesprek_id": {}, "duur_seconden": {}}}"#, index + 1, 60 + index * 13);
        sqlx::query(
            "INSERT INTO logs (id, type, status, message, data, user_id, ip, device, region) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(format!("log-{:04}", index))
        .bind(if index % 2 == 0 { "call" } else { "system" })
        .bind(if index % 5 == 0 { "error" } else { "ok" })
        .bind(format!("Gebeurtenis {}", index + 1))
        .bind(data)
        .bind("admin@example.com")
        .bind("127.0.0.1")
        .bind("desktop")
        .bind(["Noord", "Oost", "Zuid", "West"][index % 4])
        .execute(pool)
        .await?;
    }

    let instellingen = [
        ("bedrijfsnaam", "CRM Admin BV", "Naam getoond in rapportages"),
        ("max_gesprekken_per_dag", "25", "Limiet per verkoper"),
    ];
    for (key, value, beschrijving) in instellingen {
        sqlx::query("INSERT INTO instellingen (key, value, beschrijving) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(beschrijving)
            .execute(pool)
            .await?;
    }

    tracing::info!(
        "Sample data seeded: 4 regios, 40 klanten, 8 verkopers, 3 campagnes, 60 gesprekken, 20 logs"
    );
    Ok(())
}
