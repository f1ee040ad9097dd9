//! SAML 2.0 protocol constants: namespaces, URIs and well-known values.

/// SAML 2.0 assertion namespace.
pub const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// SAML 2.0 protocol namespace.
pub const SAMLP_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// XML digital signature namespace.
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML encryption namespace.
pub const XMLENC_NS: &str = "http://www.w3.org/2001/04/xmlenc#";

/// The only SAML version this crate speaks.
pub const SAML_VERSION: &str = "2.0";

/// Conventional namespace prefixes used on output.
pub mod prefixes {
    /// Assertion namespace prefix.
    pub const SAML: &str = "saml";
    /// Protocol namespace prefix.
    pub const SAMLP: &str = "samlp";
    /// XML-DSig namespace prefix.
    pub const DSIG: &str = "ds";
}

/// First-level and second-level status code values.
pub mod status_codes {
    /// Request succeeded.
    pub const SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";
    /// Requester error.
    pub const REQUESTER: &str = "urn:oasis:names:tc:SAML:2.0:status:Requester";
    /// Responder error.
    pub const RESPONDER: &str = "urn:oasis:names:tc:SAML:2.0:status:Responder";
    /// Version mismatch.
    pub const VERSION_MISMATCH: &str = "urn:oasis:names:tc:SAML:2.0:status:VersionMismatch";
    /// Authentication failed.
    pub const AUTHN_FAILED: &str = "urn:oasis:names:tc:SAML:2.0:status:AuthnFailed";
    /// Request denied.
    pub const REQUEST_DENIED: &str = "urn:oasis:names:tc:SAML:2.0:status:RequestDenied";
    /// Unknown principal.
    pub const UNKNOWN_PRINCIPAL: &str = "urn:oasis:names:tc:SAML:2.0:status:UnknownPrincipal";
}

/// NameID format URIs.
pub mod name_id_formats {
    /// Entity identifier format, the default for `Issuer`.
    pub const ENTITY: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:entity";
    /// Persistent pseudonymous identifier.
    pub const PERSISTENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent";
    /// Transient identifier.
    pub const TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";
    /// Unspecified format.
    pub const UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";
    /// Email address format.
    pub const EMAIL: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";
}

/// Subject confirmation method URIs.
pub mod confirmation_methods {
    /// Bearer confirmation, used by Web Browser SSO.
    pub const BEARER: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";
    /// Holder-of-key confirmation.
    pub const HOLDER_OF_KEY: &str = "urn:oasis:names:tc:SAML:2.0:cm:holder-of-key";
}

/// Authentication context class reference URIs.
pub mod authn_contexts {
    /// Password over a protected transport.
    pub const PASSWORD_PROTECTED_TRANSPORT: &str =
        "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport";
    /// Plain password.
    pub const PASSWORD: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:Password";
    /// Unspecified context.
    pub const UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:unspecified";
}

/// Protocol binding URIs.
pub mod bindings {
    /// HTTP POST binding.
    pub const HTTP_POST: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";
    /// HTTP Redirect binding.
    pub const HTTP_REDIRECT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";
    /// HTTP Artifact binding.
    pub const HTTP_ARTIFACT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Artifact";
}

/// XML-DSig algorithm and transform URIs.
pub mod dsig {
    /// Exclusive XML Canonicalization 1.0 (omits comments).
    pub const EXCLUSIVE_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
    /// Exclusive XML Canonicalization 1.0 with comments.
    pub const EXCLUSIVE_C14N_WITH_COMMENTS: &str =
        "http://www.w3.org/2001/10/xml-exc-c14n#WithComments";
    /// Enveloped signature transform.
    pub const ENVELOPED_SIGNATURE: &str =
        "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
    /// DSA with SHA-1.
    pub const DSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#dsa-sha1";
    /// RSA with SHA-1.
    pub const RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";
    /// RSA with SHA-256.
    pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
    /// ECDSA with SHA-256.
    pub const ECDSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256";
    /// SHA-1 digest.
    pub const SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
    /// SHA-256 digest.
    pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
}
