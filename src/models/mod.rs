// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - users : Utilisateurs (username/email uniques, hash Werkzeug)
//   - password_reset_tokens : Tokens de reset password (expire 1h)
//   - candidature : Candidatures suivies (état, tags, contacts, rappels)
//   - document : Documents attachés à une candidature (CV, lettres...)
//   - dto : Data Transfer Objects pour les réponses API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les relations entre tables sont définies dans chaque modèle
//   - Suppression d'un user => cascade sur candidatures + tokens
//   - Suppression d'une candidature => cascade sur documents
//
// ============================================================================

pub mod candidature;
pub mod document;
pub mod dto;
pub mod password_reset_tokens;
pub mod users;
