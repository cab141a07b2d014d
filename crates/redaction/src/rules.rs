/// A single redaction rule specification, as compiled from the built-in
/// catalog or injected at runtime.
///
/// `pattern` is a regex source string. `replacement` is either a literal
/// placeholder of the shape `[<TYPE>_MASKED]`, or a template referencing
/// named capture groups (e.g. `${prefix}[USERNAME]`) for rules that must
/// preserve surrounding context.
#[derive(Clone, Debug)]
pub struct RuleSpec {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
    pub enabled: bool,
}

/// The built-in catalog, in the order rules must be applied: narrow,
/// high-specificity patterns first, broad catch-alls last. A rule only
/// ever operates on text a prior rule may have already rewritten —
/// nothing un-masks, so this order is part of the contract.
pub fn builtin_catalog() -> Vec<RuleSpec> {
    vec![
        // --- Vendor-specific key prefixes (most specific; must win over
        // the generic secret/apiKey catch-alls below). ---
        spec(
            "openaiKey",
            r"sk-[A-Za-z0-9]{20,}",
            "[OPENAI_KEY_MASKED]",
        ),
        spec(
            "anthropicKey",
            r"sk-ant-[A-Za-z0-9\-_]{20,}",
            "[ANTHROPIC_KEY_MASKED]",
        ),
        spec(
            "githubToken",
            r"gh[pousr]_[A-Za-z0-9]{36,255}",
            "[GITHUB_TOKEN_MASKED]",
        ),
        spec(
            "awsAccessKey",
            r"AKIA[0-9A-Z]{16}",
            "[AWS_ACCESS_KEY_MASKED]",
        ),
        spec(
            "awsSecretKey",
            r"(?i)aws_secret_access_key\s*[:=]\s*['\x22]?[A-Za-z0-9/+=]{40}['\x22]?",
            "[AWS_SECRET_KEY_MASKED]",
        ),
        spec(
            "slackToken",
            r"xox[baprs]-[A-Za-z0-9\-]{10,}",
            "[SLACK_TOKEN_MASKED]",
        ),
        spec(
            "slackWebhook",
            r"https://hooks\.slack\.com/services/[A-Za-z0-9/]+",
            "[SLACK_WEBHOOK_MASKED]",
        ),
        spec(
            "stripeSecretKey",
            r"sk_live_[A-Za-z0-9]{24,}",
            "[STRIPE_SECRET_KEY_MASKED]",
        ),
        spec(
            "stripePublicKey",
            r"pk_live_[A-Za-z0-9]{24,}",
            "[STRIPE_PUBLIC_KEY_MASKED]",
        ),
        spec(
            "googleApiKey",
            r"AIza[0-9A-Za-z\-_]{35}",
            "[GOOGLE_API_KEY_MASKED]",
        ),
        spec("twilioKey", r"SK[0-9a-f]{32}", "[TWILIO_KEY_MASKED]"),
        spec(
            "sendgridKey",
            r"SG\.[A-Za-z0-9_\-]{22}\.[A-Za-z0-9_\-]{43}",
            "[SENDGRID_KEY_MASKED]",
        ),
        spec("npmToken", r"npm_[A-Za-z0-9]{36}", "[NPM_TOKEN_MASKED]"),
        spec(
            "digitalOceanToken",
            r"dop_v1_[a-f0-9]{64}",
            "[DIGITALOCEAN_TOKEN_MASKED]",
        ),
        spec(
            "mailgunKey",
            r"key-[a-f0-9]{32}",
            "[MAILGUN_KEY_MASKED]",
        ),
        spec(
            "shopifyToken",
            r"sh(?:pat|pss|pca)_[a-fA-F0-9]{32,}",
            "[SHOPIFY_TOKEN_MASKED]",
        ),
        spec(
            "discordBotToken",
            r"[MTN][A-Za-z\d]{23}\.[\w\-]{6}\.[\w\-]{27}",
            "[DISCORD_TOKEN_MASKED]",
        ),
        spec(
            "facebookAccessToken",
            r"EAACEdEose0cBA[0-9A-Za-z]+",
            "[FACEBOOK_TOKEN_MASKED]",
        ),
        spec(
            "twitterBearerToken",
            r"AAAAAAAAAAAAAAAAAAAAA[A-Za-z0-9%]{35,44}",
            "[TWITTER_TOKEN_MASKED]",
        ),
        spec(
            "cloudflareApiToken",
            r"(?i)cloudflare[_-]?api[_-]?token\s*[:=]\s*['\x22]?[A-Za-z0-9_\-]{30,}['\x22]?",
            "[CLOUDFLARE_TOKEN_MASKED]",
        ),
        spec(
            "azureClientSecret",
            r"(?i)azure_client_secret\s*[:=]\s*['\x22]?[A-Za-z0-9~._\-]{30,}['\x22]?",
            "[AZURE_SECRET_MASKED]",
        ),
        // --- Database / cache connection URIs with embedded credentials. ---
        spec(
            "postgresUri",
            r"postgres(?:ql)?://[^:\s/@]+:[^@\s/]+@[^\s/]+(?:/[^\s]*)?",
            "[POSTGRES_URI_MASKED]",
        ),
        spec(
            "mysqlUri",
            r"mysql://[^:\s/@]+:[^@\s/]+@[^\s/]+(?:/[^\s]*)?",
            "[MYSQL_URI_MASKED]",
        ),
        spec(
            "mongodbUri",
            r"mongodb(?:\+srv)?://[^:\s/@]+:[^@\s/]+@[^\s/]+(?:/[^\s]*)?",
            "[MONGODB_URI_MASKED]",
        ),
        spec(
            "redisUri",
            r"rediss?://[^:\s/@]*:[^@\s/]+@[^\s/]+(?:/[^\s]*)?",
            "[REDIS_URI_MASKED]",
        ),
        spec(
            "amqpUri",
            r"amqps?://[^:\s/@]+:[^@\s/]+@[^\s/]+(?:/[^\s]*)?",
            "[AMQP_URI_MASKED]",
        ),
        spec(
            "genericUrlCredentials",
            r"[a-zA-Z][a-zA-Z0-9+.\-]*://[^:\s/@]+:[^@\s/]+@[^\s/]+",
            "[URL_CREDENTIALS_MASKED]",
        ),
        // --- PEM private key blocks. ---
        spec(
            "pemPrivateKey",
            r"(?s)-----BEGIN (?:RSA |OPENSSH |DSA |EC |PGP )?PRIVATE KEY-----.*?-----END (?:RSA |OPENSSH |DSA |EC |PGP )?PRIVATE KEY-----",
            "[PEM_PRIVATE_KEY_MASKED]",
        ),
        // --- JWTs. ---
        spec(
            "jwt",
            r"eyJ[A-Za-z0-9_\-]+\.eyJ[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+",
            "[JWT_MASKED]",
        ),
        // --- Filesystem paths (templated — preserve prefix/suffix). ---
        spec(
            "homeDirectoryUnix",
            r"(?P<prefix>/(?:Users|home)/)(?P<user>[^/\s]+)",
            "${prefix}[USERNAME]",
        ),
        spec(
            "homeDirectoryWindows",
            r"(?P<prefix>[A-Za-z]:\\Users\\)(?P<user>[^\\\s]+)",
            "${prefix}[USERNAME]",
        ),
        // --- Contact information. ---
        spec(
            "email",
            r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}",
            "[EMAIL_MASKED]",
        ),
        spec(
            "phoneE164",
            r"\+[1-9]\d{1,2}[\s.\-]?\(?\d{3}\)?[\s.\-]?\d{3}[\s.\-]?\d{4}\b",
            "[PHONE_MASKED]",
        ),
        spec(
            "phoneNanp",
            r"\b\(\d{3}\)[\s.\-]?\d{3}[\s.\-]?\d{4}\b",
            "[PHONE_MASKED]",
        ),
        spec(
            "phoneIntlNoPlus",
            r"\b00[1-9]\d{1,2}[\s.\-]?\d{3}[\s.\-]?\d{3,4}[\s.\-]?\d{3,4}\b",
            "[PHONE_MASKED]",
        ),
        spec(
            "streetAddress",
            r"\b\d{1,5}\s+(?:[A-Za-z]+\s){1,4}(?:Street|St|Avenue|Ave|Boulevard|Blvd|Road|Rd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl)\b\.?",
            "[ADDRESS_MASKED]",
        ),
        spec(
            "usZipCode",
            r"\b\d{5}-\d{4}\b",
            "[ZIP_CODE_MASKED]",
        ),
        // --- Government ID. ---
        spec("ssn", r"\b\d{3}-\d{2}-\d{4}\b", "[SSN_MASKED]"),
        spec(
            "passportLike",
            r"\b[A-Z]{1,2}\d{6,9}\b",
            "[PASSPORT_MASKED]",
        ),
        spec(
            "ukNino",
            r"\b[A-CEGHJ-PR-TW-Z]{2}\d{6}[A-D]\b",
            "[NATIONAL_ID_MASKED]",
        ),
        spec(
            "usDriversLicense",
            r"(?i)driver'?s?\s*licen[sc]e\s*[:#]?\s*[A-Za-z0-9]{6,12}\b",
            "[DRIVERS_LICENSE_MASKED]",
        ),
        spec(
            "usItin",
            r"\b9\d{2}-[7-9]\d-\d{4}\b",
            "[ITIN_MASKED]",
        ),
        // --- Financial. ---
        spec(
            "creditCardLike",
            r"\b(?:\d[ \-]?){13,19}\b",
            "[CREDIT_CARD_MASKED]",
        ),
        spec(
            "iban",
            r"\b[A-Z]{2}\d{2}[A-Z0-9]{10,30}\b",
            "[IBAN_MASKED]",
        ),
        // Requires a digit in the location-code pair so generic all-letter
        // words (including our own placeholder text) never match.
        spec(
            "swiftBic",
            r"\b[A-Z]{4}[A-Z]{2}(?:\d[A-Z0-9]|[A-Z]\d)(?:[A-Z0-9]{3})?\b",
            "[SWIFT_BIC_MASKED]",
        ),
        spec(
            "usBankRoutingNumber",
            r"(?i)routing\s*(?:number|#)?\s*[:=]?\s*\d{9}\b",
            "[ROUTING_NUMBER_MASKED]",
        ),
        // --- Network identifiers. ---
        spec(
            "ipv4Address",
            r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
            "[IP_ADDRESS_MASKED]",
        ),
        spec(
            "ipv6Address",
            r"\b(?:[A-Fa-f0-9]{1,4}:){7}[A-Fa-f0-9]{1,4}\b",
            "[IP_ADDRESS_MASKED]",
        ),
        spec(
            "macAddress",
            r"\b(?:[0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}\b",
            "[MAC_ADDRESS_MASKED]",
        ),
        // --- Bearer tokens embedded inline in body text. ---
        spec(
            "inlineBearerToken",
            r"(?i)bearer\s+[A-Za-z0-9\-._~+/]{20,}=*",
            "[BEARER_TOKEN_MASKED]",
        ),
        // --- Generic secret / api-key assignments (broad; must run
        // after every vendor-specific rule above). ---
        spec(
            "genericSecretAssignment",
            r#"(?i)(?:secret|token|password|passwd|pwd)\s*[:=]\s*['\x22]?[^\s'\x22]{6,}['\x22]?"#,
            "[SECRET_MASKED]",
        ),
        spec(
            "genericApiKeyAssignment",
            r#"(?i)api[_-]?key\s*[:=]\s*['\x22]?[^\s'\x22]{6,}['\x22]?"#,
            "[API_KEY_MASKED]",
        ),
        // --- Broadest catch-all: raw 40-char hex token, applied last so
        // every narrower rule gets first refusal at the same region. ---
        spec(
            "rawHexToken40",
            r"\b[A-Fa-f0-9]{40}\b",
            "[TOKEN_MASKED]",
        ),
    ]
}

const fn spec(name: &'static str, pattern: &'static str, replacement: &'static str) -> RuleSpec {
    RuleSpec {
        name,
        pattern,
        replacement,
        enabled: true,
    }
}
