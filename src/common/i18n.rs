// src/common/i18n.rs

use std::collections::HashMap;

/// Idioma usado quando o cliente pede algo que não conhecemos.
pub const DEFAULT_LANG: &str = "pt";

// Catálogo embutido: (chave, português, inglês)
const CATALOG: &[(&str, &str, &str)] = &[
    ("error.validation", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("error.invalid_date_range", "A data final ({end}) é anterior à data inicial ({start}).", "End date ({end}) is before start date ({start})."),
    ("error.invalid_token", "Token de autenticação inválido ou ausente.", "Missing or invalid authentication token."),
    ("error.forbidden", "Você não tem permissão para realizar esta ação.", "You are not allowed to perform this action."),
    ("error.missing_role", "Você precisa do perfil '{role}' para realizar esta ação.", "You need the '{role}' role to perform this action."),
    ("error.approval_not_found", "Aprovação {id} não encontrada.", "Approval {id} not found."),
    ("error.request_not_found", "Solicitação de treinamento {id} não encontrada.", "Training request {id} not found."),
    ("error.notification_not_found", "Notificação {id} não encontrada.", "Notification {id} not found."),
    ("error.approval_already_decided", "A aprovação {id} já foi decidida.", "Approval {id} has already been decided."),
    ("error.invalid_approval_level", "O próximo nível ({requested}) deve ser maior que o nível atual ({current}).", "Next level ({requested}) must be greater than the current level ({current})."),
    ("error.request_mismatch", "Os dados enviados não correspondem à aprovação.", "Submitted identifiers do not match the approval."),
    ("error.invalid_delegate", "O delegado deve ser diferente do aprovador atual.", "The delegate must differ from the current approver."),
    ("error.missing_next_approver", "Informe o próximo aprovador ao definir nível ou perfil.", "A next approver is required when a level or role is given."),
    ("error.internal", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
    ("certificate.title", "Verificação de Certificado", "Certificate Verification"),
    ("certificate.valid", "Certificado válido", "Valid certificate"),
    ("certificate.expired", "Certificado expirado", "Expired certificate"),
    ("certificate.revoked", "Certificado revogado", "Revoked certificate"),
    ("certificate.not_found", "Certificado não encontrado", "Certificate not found"),
    ("certificate.missing_token", "Token de verificação ausente", "Missing verification token"),
    ("certificate.recipient", "Participante", "Recipient"),
    ("certificate.course", "Curso", "Course"),
    ("certificate.issued_at", "Emitido em", "Issued on"),
    ("certificate.expires_at", "Válido até", "Valid until"),
    ("certificate.revoked_at", "Revogado em", "Revoked on"),
];

/// Mensagens traduzidas por idioma. Montado uma vez no `AppState`.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut pt = HashMap::new();
        let mut en = HashMap::new();
        for (key, pt_msg, en_msg) in CATALOG {
            pt.insert(*key, *pt_msg);
            en.insert(*key, *en_msg);
        }

        let mut messages = HashMap::new();
        messages.insert("pt", pt);
        messages.insert("en", en);
        Self { messages }
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.messages.contains_key(lang)
    }

    /// Busca a mensagem no idioma pedido, caindo para o padrão e, por último, para a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    /// Igual a `translate`, substituindo `{nome}` pelos argumentos.
    pub fn translate_with(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let mut msg = self.translate(lang, key);
        for (name, value) in args {
            msg = msg.replace(&format!("{{{}}}", name), value);
        }
        msg
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
